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

//! Station-wide sales statistics.
//!
//! All four figures live behind a single lock, so a snapshot never shows a
//! sale counted without its revenue.
//!
//! # Example
//!
//! ```
//! use gas_station_rs::StatisticsAggregator;
//! use rust_decimal_macros::dec;
//!
//! let stats = StatisticsAggregator::new();
//! stats.record_sale(dec!(16.20)).unwrap();
//! stats.record_cancellation_no_gas();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.revenue, dec!(16.20));
//! assert_eq!(snapshot.sales, 1);
//! assert_eq!(snapshot.cancellations_no_gas, 1);
//! ```

use crate::StationError;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Point-in-time copy of the station statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationStatistics {
    /// Sum of all successful charges.
    pub revenue: Decimal,
    /// Number of successful purchases.
    pub sales: u64,
    pub cancellations_no_gas: u64,
    pub cancellations_too_expensive: u64,
}

impl StationStatistics {
    const DECIMAL_PRECISION: u32 = 4;

    /// Every purchase attempt that reached a final outcome.
    pub fn attempts(&self) -> u64 {
        self.sales + self.cancellations_no_gas + self.cancellations_too_expensive
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.revenue >= Decimal::ZERO,
            "Invariant violated: revenue went negative: {}",
            self.revenue
        );
        debug_assert!(
            self.sales > 0 || self.revenue == Decimal::ZERO,
            "Invariant violated: revenue {} recorded without a sale",
            self.revenue
        );
    }
}

impl Serialize for StationStatistics {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("StationStatistics", 4)?;
        state.serialize_field(
            "revenue",
            &self.revenue.round_dp(StationStatistics::DECIMAL_PRECISION),
        )?;
        state.serialize_field("sales", &self.sales)?;
        state.serialize_field("cancellations_no_gas", &self.cancellations_no_gas)?;
        state.serialize_field(
            "cancellations_too_expensive",
            &self.cancellations_too_expensive,
        )?;
        state.end()
    }
}

/// Running totals of revenue, sales, and cancellations.
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    inner: Mutex<StationStatistics>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StationStatistics::default()),
        }
    }

    /// Counts one sale and adds its charge to the revenue.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::RevenueOverflow`] if the revenue would leave
    /// the decimal range; nothing is recorded then.
    pub fn record_sale(&self, charge: Decimal) -> Result<(), StationError> {
        let mut data = self.inner.lock();
        let revenue = data
            .revenue
            .checked_add(charge)
            .ok_or(StationError::RevenueOverflow)?;
        data.revenue = revenue;
        data.sales += 1;
        data.assert_invariants();
        Ok(())
    }

    pub fn record_cancellation_no_gas(&self) {
        self.inner.lock().cancellations_no_gas += 1;
    }

    pub fn record_cancellation_too_expensive(&self) {
        self.inner.lock().cancellations_too_expensive += 1;
    }

    /// Returns all four figures as read under one lock acquisition.
    pub fn snapshot(&self) -> StationStatistics {
        *self.inner.lock()
    }

    pub fn revenue(&self) -> Decimal {
        self.inner.lock().revenue
    }

    pub fn sales(&self) -> u64 {
        self.inner.lock().sales
    }

    pub fn cancellations_no_gas(&self) -> u64 {
        self.inner.lock().cancellations_no_gas
    }

    pub fn cancellations_too_expensive(&self) -> u64 {
        self.inner.lock().cancellations_too_expensive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_aggregator_is_empty() {
        let stats = StatisticsAggregator::new();
        assert_eq!(stats.snapshot(), StationStatistics::default());
        assert_eq!(stats.snapshot().attempts(), 0);
    }

    #[test]
    fn record_sale_adds_revenue_and_count() {
        let stats = StatisticsAggregator::new();
        stats.record_sale(dec!(10.0)).unwrap();
        stats.record_sale(dec!(48.60)).unwrap();
        assert_eq!(stats.revenue(), dec!(58.60));
        assert_eq!(stats.sales(), 2);
        assert_eq!(stats.cancellations_no_gas(), 0);
        assert_eq!(stats.cancellations_too_expensive(), 0);
    }

    #[test]
    fn cancellations_are_counted_separately() {
        let stats = StatisticsAggregator::new();
        stats.record_cancellation_no_gas();
        stats.record_cancellation_too_expensive();
        stats.record_cancellation_too_expensive();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cancellations_no_gas, 1);
        assert_eq!(snapshot.cancellations_too_expensive, 2);
        assert_eq!(snapshot.sales, 0);
        assert_eq!(snapshot.revenue, Decimal::ZERO);
        assert_eq!(snapshot.attempts(), 3);
    }

    #[test]
    fn snapshot_is_detached_from_later_updates() {
        let stats = StatisticsAggregator::new();
        stats.record_sale(dec!(5)).unwrap();
        let before = stats.snapshot();
        stats.record_sale(dec!(5)).unwrap();
        assert_eq!(before.sales, 1);
        assert_eq!(stats.sales(), 2);
    }

    #[test]
    fn revenue_overflow_records_nothing() {
        let stats = StatisticsAggregator::new();
        stats.record_sale(dec!(50000000000000000000000000000)).unwrap();

        assert_eq!(
            stats.record_sale(dec!(50000000000000000000000000000)),
            Err(StationError::RevenueOverflow)
        );

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sales, 1);
        assert_eq!(snapshot.revenue, dec!(50000000000000000000000000000));
    }

    #[test]
    fn serializer_rounds_revenue_to_four_decimal_places() {
        let stats = StationStatistics {
            revenue: dec!(123.456789),
            sales: 3,
            cancellations_no_gas: 1,
            cancellations_too_expensive: 2,
        };

        let json = serde_json::to_string(&stats).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["revenue"].as_str().unwrap(), "123.4568");
        assert_eq!(parsed["sales"], 3);
        assert_eq!(parsed["cancellations_no_gas"], 1);
        assert_eq!(parsed["cancellations_too_expensive"], 2);
    }
}
