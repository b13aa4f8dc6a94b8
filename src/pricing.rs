// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Price per unit for each fuel type.

use crate::StationError;
use crate::base::FuelType;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Concurrent fuel price table.
///
/// Each entry is replaced as a whole, so readers see either the old or the
/// new price, never a mix.
#[derive(Debug, Default)]
pub struct PricingTable {
    prices: DashMap<FuelType, Decimal>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self {
            prices: DashMap::new(),
        }
    }

    /// Replaces the price for `fuel_type`.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InvalidPrice`] for a negative price.
    pub fn set(&self, fuel_type: FuelType, price: Decimal) -> Result<(), StationError> {
        if price < Decimal::ZERO {
            return Err(StationError::InvalidPrice);
        }
        self.prices.insert(fuel_type, price);
        Ok(())
    }

    /// Returns the configured price, or `None` if it was never set.
    pub fn get(&self, fuel_type: FuelType) -> Option<Decimal> {
        self.prices.get(&fuel_type).map(|price| *price)
    }
}
