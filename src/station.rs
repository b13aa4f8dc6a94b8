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

//! Gas station.
//!
//! The [`GasStation`] ties together the price table, the pump pool, and the
//! sales statistics. Each purchase runs through the same steps:
//!
//! ```text
//! PriceCheck ──ceiling below price──► GasTooExpensive
//!     │
//!     ▼
//! Allocate ──no pump can serve──► NotEnoughGas
//!     │
//!     ▼
//! Success (charge = amount × checked price)
//! ```
//!
//! # Thread Safety
//!
//! Purchases only take `&self`; share the station through an [`Arc`](std::sync::Arc)
//! once setup is done. Buyers contend only on the pumps they actually touch
//! and on the short statistics update at the end.

use crate::StationError;
use crate::base::{FuelType, PumpId};
use crate::config::{StationConfig, UnpricedFuelPolicy};
use crate::pricing::PricingTable;
use crate::pump::{Pump, PumpPool};
use crate::statistics::{StationStatistics, StatisticsAggregator};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// A station serving concurrent fuel purchases.
///
/// # Invariants
///
/// - A failed purchase dispenses nothing and charges nothing.
/// - A successful purchase dispenses exactly the requested amount from one pump.
/// - Every purchase that reaches a price check or allocation counts exactly once
///   as a sale or as one kind of cancellation.
#[derive(Debug)]
pub struct GasStation {
    prices: PricingTable,
    pumps: PumpPool,
    statistics: StatisticsAggregator,
    config: StationConfig,
}

impl GasStation {
    /// Creates a station with no pumps, no prices, and default settings.
    pub fn new() -> Self {
        Self::with_config(StationConfig::default())
    }

    pub fn with_config(config: StationConfig) -> Self {
        GasStation {
            prices: PricingTable::new(),
            pumps: PumpPool::new(config.contention),
            statistics: StatisticsAggregator::new(),
            config,
        }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Adds a pump holding `stock` units of `fuel_type`.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InvalidAmount`] for a negative stock.
    pub fn add_pump(&mut self, fuel_type: FuelType, stock: Decimal) -> Result<PumpId, StationError> {
        let pump = self.pumps.add(fuel_type, stock)?;
        debug!(pump = %pump, fuel = %fuel_type, stock = %stock, "pump added");
        Ok(pump)
    }

    /// Sets the price per unit for `fuel_type`. Only later purchases see it.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InvalidPrice`] for a negative price.
    pub fn set_price(&self, fuel_type: FuelType, price: Decimal) -> Result<(), StationError> {
        self.prices.set(fuel_type, price)?;
        debug!(fuel = %fuel_type, price = %price, "price set");
        Ok(())
    }

    /// Returns the price per unit for `fuel_type`, or zero if none was set.
    pub fn price(&self, fuel_type: FuelType) -> Decimal {
        self.prices.get(fuel_type).unwrap_or(Decimal::ZERO)
    }

    /// Buys `amount` units of `fuel_type` if the price is at most `max_price`.
    ///
    /// Returns the charge, `amount × price`, using the price the ceiling was
    /// checked against.
    ///
    /// # Errors
    ///
    /// - [`StationError::InvalidAmount`] - `amount` is not positive.
    /// - [`StationError::InvalidPrice`] - `max_price` is negative.
    /// - [`StationError::PriceNotSet`] - no price is set and unpriced fuel is rejected.
    /// - [`StationError::GasTooExpensive`] - `max_price` is below the current price.
    /// - [`StationError::ChargeOverflow`] - `amount × price` is out of range.
    /// - [`StationError::NotEnoughGas`] - no single pump can supply `amount`.
    /// - [`StationError::RevenueOverflow`] - the revenue cannot take the charge;
    ///   the dispensed fuel is put back.
    pub fn buy_gas(
        &self,
        fuel_type: FuelType,
        amount: Decimal,
        max_price: Decimal,
    ) -> Result<Decimal, StationError> {
        if amount <= Decimal::ZERO {
            return Err(StationError::InvalidAmount);
        }
        if max_price < Decimal::ZERO {
            return Err(StationError::InvalidPrice);
        }

        let price = self.checked_price(fuel_type)?;
        if max_price < price {
            self.statistics.record_cancellation_too_expensive();
            info!(
                fuel = %fuel_type,
                amount = %amount,
                price = %price,
                max_price = %max_price,
                "purchase cancelled: too expensive"
            );
            return Err(StationError::GasTooExpensive);
        }

        let charge = amount
            .checked_mul(price)
            .ok_or(StationError::ChargeOverflow)?;

        let dispensed = match self.pumps.dispense(fuel_type, amount) {
            Ok(dispensed) => dispensed,
            Err(e) => {
                if e == StationError::NotEnoughGas {
                    self.statistics.record_cancellation_no_gas();
                    info!(fuel = %fuel_type, amount = %amount, "purchase cancelled: not enough gas");
                }
                return Err(e);
            }
        };

        if let Err(e) = self.statistics.record_sale(charge) {
            // Statistics guard is released here; only the pump guard is taken.
            self.pumps.restore(&dispensed, amount);
            warn!(
                pump = %dispensed.pump,
                fuel = %fuel_type,
                charge = %charge,
                reason = %e,
                "sale rolled back"
            );
            return Err(e);
        }
        debug!(
            pump = %dispensed.pump,
            fuel = %fuel_type,
            amount = %amount,
            charge = %charge,
            remaining = %dispensed.remaining,
            "sale completed"
        );
        Ok(charge)
    }

    fn checked_price(&self, fuel_type: FuelType) -> Result<Decimal, StationError> {
        match (self.prices.get(fuel_type), self.config.unpriced_fuel) {
            (Some(price), _) => Ok(price),
            (None, UnpricedFuelPolicy::Free) => {
                warn!(fuel = %fuel_type, "no price set, selling at zero");
                Ok(Decimal::ZERO)
            }
            (None, UnpricedFuelPolicy::Reject) => {
                warn!(fuel = %fuel_type, "no price set, purchase rejected");
                Err(StationError::PriceNotSet(fuel_type))
            }
        }
    }

    /// Returns a detached copy of every pump, in the order they were added.
    pub fn pumps(&self) -> Vec<Pump> {
        self.pumps.snapshot()
    }

    /// Returns revenue, sales, and cancellations as of one instant.
    pub fn statistics(&self) -> StationStatistics {
        self.statistics.snapshot()
    }

    pub fn revenue(&self) -> Decimal {
        self.statistics.revenue()
    }

    pub fn number_of_sales(&self) -> u64 {
        self.statistics.sales()
    }

    pub fn number_of_cancellations_no_gas(&self) -> u64 {
        self.statistics.cancellations_no_gas()
    }

    pub fn number_of_cancellations_too_expensive(&self) -> u64 {
        self.statistics.cancellations_too_expensive()
    }
}

impl Default for GasStation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentionPolicy;
    use rust_decimal_macros::dec;

    fn regular_station() -> GasStation {
        let mut station = GasStation::new();
        station.add_pump(FuelType::Regular, dec!(100)).unwrap();
        station.set_price(FuelType::Regular, dec!(1.0)).unwrap();
        station
    }

    #[test]
    fn charge_uses_price_at_check_time() {
        let station = regular_station();
        station.set_price(FuelType::Regular, dec!(1.25)).unwrap();

        let charge = station.buy_gas(FuelType::Regular, dec!(8), dec!(2)).unwrap();

        assert_eq!(charge, dec!(10.00));
        assert_eq!(station.revenue(), dec!(10.00));
    }

    #[test]
    fn ceiling_equal_to_price_is_accepted() {
        let station = regular_station();
        assert_eq!(
            station.buy_gas(FuelType::Regular, dec!(10), dec!(1.0)),
            Ok(dec!(10.0))
        );
    }

    #[test]
    fn invalid_amount_changes_nothing() {
        let station = regular_station();

        assert_eq!(
            station.buy_gas(FuelType::Regular, Decimal::ZERO, dec!(2)),
            Err(StationError::InvalidAmount)
        );
        assert_eq!(station.statistics(), StationStatistics::default());
        assert_eq!(station.pumps()[0].remaining(), dec!(100));
    }

    #[test]
    fn negative_ceiling_is_rejected() {
        let station = regular_station();
        assert_eq!(
            station.buy_gas(FuelType::Regular, dec!(1), dec!(-1)),
            Err(StationError::InvalidPrice)
        );
        assert_eq!(station.statistics().attempts(), 0);
    }

    #[test]
    fn unpriced_fuel_is_free_by_default() {
        let mut station = GasStation::new();
        station.add_pump(FuelType::Super, dec!(50)).unwrap();

        assert_eq!(station.price(FuelType::Super), Decimal::ZERO);
        assert_eq!(
            station.buy_gas(FuelType::Super, dec!(10), Decimal::ZERO),
            Ok(Decimal::ZERO)
        );
        assert_eq!(station.number_of_sales(), 1);
        assert_eq!(station.pumps()[0].remaining(), dec!(40));
    }

    #[test]
    fn unpriced_fuel_can_be_rejected() {
        let mut station = GasStation::with_config(StationConfig {
            unpriced_fuel: UnpricedFuelPolicy::Reject,
            contention: ContentionPolicy::Yield,
        });
        station.add_pump(FuelType::Super, dec!(50)).unwrap();

        assert_eq!(
            station.buy_gas(FuelType::Super, dec!(10), dec!(5)),
            Err(StationError::PriceNotSet(FuelType::Super))
        );
        assert_eq!(station.price(FuelType::Super), Decimal::ZERO);
        assert_eq!(station.statistics().attempts(), 0);
        assert_eq!(station.pumps()[0].remaining(), dec!(50));
    }

    #[test]
    fn price_check_runs_before_allocation() {
        let station = regular_station();

        // Both too expensive and too large: the price check wins.
        assert_eq!(
            station.buy_gas(FuelType::Regular, dec!(500), dec!(0.5)),
            Err(StationError::GasTooExpensive)
        );
        assert_eq!(station.number_of_cancellations_too_expensive(), 1);
        assert_eq!(station.number_of_cancellations_no_gas(), 0);
    }

    #[test]
    fn charge_overflow_fails_before_dispensing() {
        let mut station = GasStation::new();
        station
            .add_pump(FuelType::Regular, dec!(1000000000000000000000000000))
            .unwrap();
        station.set_price(FuelType::Regular, dec!(1000)).unwrap();

        assert_eq!(
            station.buy_gas(FuelType::Regular, dec!(1000000000000000000000000000), dec!(1000)),
            Err(StationError::ChargeOverflow)
        );
        assert_eq!(
            station.pumps()[0].remaining(),
            dec!(1000000000000000000000000000)
        );
        assert_eq!(station.statistics(), StationStatistics::default());
    }

    #[test]
    fn revenue_overflow_puts_fuel_back() {
        let mut station = GasStation::new();
        station
            .add_pump(FuelType::Diesel, dec!(70000000000000000000000000000))
            .unwrap();
        station
            .add_pump(FuelType::Diesel, dec!(70000000000000000000000000000))
            .unwrap();
        station.set_price(FuelType::Diesel, dec!(1)).unwrap();

        let big = dec!(50000000000000000000000000000);
        assert_eq!(station.buy_gas(FuelType::Diesel, big, dec!(1)), Ok(big));
        assert_eq!(
            station.buy_gas(FuelType::Diesel, big, dec!(1)),
            Err(StationError::RevenueOverflow)
        );

        let stats = station.statistics();
        assert_eq!(stats.sales, 1);
        assert_eq!(stats.revenue, big);
        assert_eq!(stats.attempts(), 1);
        assert_eq!(
            station.pumps().iter().map(Pump::remaining).collect::<Vec<_>>(),
            vec![
                dec!(20000000000000000000000000000),
                dec!(70000000000000000000000000000)
            ]
        );
    }

    #[test]
    fn config_is_kept() {
        let config = StationConfig {
            unpriced_fuel: UnpricedFuelPolicy::Reject,
            contention: ContentionPolicy::Spin,
        };
        let station = GasStation::with_config(config);
        assert_eq!(*station.config(), config);
    }
}
