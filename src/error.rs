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

//! Error types for station operations.

use crate::base::FuelType;
use thiserror::Error;

/// Station errors.
///
/// Only [`GasTooExpensive`](StationError::GasTooExpensive) and
/// [`NotEnoughGas`](StationError::NotEnoughGas) count as cancellations in
/// the station statistics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StationError {
    /// The buyer's price ceiling is below the current price
    #[error("gas is too expensive")]
    GasTooExpensive,

    /// No single pump of the requested type holds the requested amount
    #[error("not enough gas")]
    NotEnoughGas,

    /// Purchase of a fuel type that has no configured price
    #[error("no price set for {0}")]
    PriceNotSet(FuelType),

    /// Amount or stock is out of range
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Price is negative
    #[error("invalid price (must not be negative)")]
    InvalidPrice,

    /// `amount × price` does not fit in a decimal
    #[error("charge out of range")]
    ChargeOverflow,

    /// Adding the charge would overflow the station revenue
    #[error("revenue out of range")]
    RevenueOverflow,
}
