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

//! # Gas Station
//!
//! This library provides a fuel station that serves many buyers at once. Each
//! buyer asks for an amount of one fuel type at a maximum price; the station
//! reserves a single pump with enough stock, dispenses from it, and keeps
//! station-wide sales statistics.
//!
//! ## Core Components
//!
//! - [`GasStation`]: Entry point for setup, purchases, and statistics
//! - [`PumpPool`]: Pumps with one guard each and the reservation scan
//! - [`PricingTable`]: Price per unit for each [`FuelType`]
//! - [`StatisticsAggregator`]: Revenue, sales, and cancellation counters
//! - [`StationError`]: Error types for failed operations
//!
//! ## Example
//!
//! ```
//! use gas_station_rs::{FuelType, GasStation, StationError};
//! use rust_decimal_macros::dec;
//!
//! let mut station = GasStation::new();
//! station.add_pump(FuelType::Regular, dec!(100)).unwrap();
//! station.set_price(FuelType::Regular, dec!(1.0)).unwrap();
//!
//! // Buy 10 units at up to 1.1 per unit
//! let charge = station.buy_gas(FuelType::Regular, dec!(10), dec!(1.1)).unwrap();
//! assert_eq!(charge, dec!(10.0));
//!
//! // A ceiling below the price cancels the purchase
//! let result = station.buy_gas(FuelType::Regular, dec!(10), dec!(0.9));
//! assert_eq!(result, Err(StationError::GasTooExpensive));
//!
//! assert_eq!(station.pumps()[0].remaining(), dec!(90));
//! assert_eq!(station.number_of_sales(), 1);
//! assert_eq!(station.number_of_cancellations_too_expensive(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! Pumps are added through `&mut GasStation` before the station is shared.
//! After that every operation takes `&self`, and purchases for different
//! pumps run in parallel. No thread ever holds two locks at once.

mod base;
pub mod config;
pub mod error;
mod pricing;
mod pump;
mod station;
mod statistics;

pub use base::{FuelType, PumpId, UnknownFuelType};
pub use config::{ContentionPolicy, StationConfig, UnpricedFuelPolicy};
pub use error::StationError;
pub use pricing::PricingTable;
pub use pump::{Dispensed, Pump, PumpPool};
pub use station::GasStation;
pub use statistics::{StationStatistics, StatisticsAggregator};
