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

//! Pumps and the pool that reserves them.
//!
//! Every pump carries its own guard. A buyer scans the pool in insertion
//! order, skips pumps of the wrong type or with too little stock, and tries
//! to take a pump's guard without blocking. A busy pump is skipped and the
//! whole pool is scanned again until the buyer is served or no pump can
//! serve the request at all.
//!
//! ```text
//!            ┌── wrong type / low stock ──► unusable (for this request)
//!  scan pump ┤
//!            ├── guard busy ──────────────► next pump, rescan later
//!            │
//!            └── guard taken ──► re-check stock ──► dispense ──► done
//!                                      │
//!                                      └── drained meanwhile ──► unusable
//! ```
//!
//! # Example
//!
//! ```
//! use gas_station_rs::{ContentionPolicy, FuelType, PumpPool};
//! use rust_decimal_macros::dec;
//!
//! let mut pool = PumpPool::new(ContentionPolicy::Spin);
//! pool.add(FuelType::Diesel, dec!(5)).unwrap();
//! pool.add(FuelType::Diesel, dec!(50)).unwrap();
//!
//! let dispensed = pool.dispense(FuelType::Diesel, dec!(10)).unwrap();
//! assert_eq!(dispensed.pump.0, 1);
//! assert_eq!(dispensed.remaining, dec!(40));
//! ```

use crate::StationError;
use crate::base::{FuelType, PumpId};
use crate::config::ContentionPolicy;
use crossbeam::atomic::AtomicCell;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Copy of a pump's state at the time it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pump {
    fuel_type: FuelType,
    remaining: Decimal,
}

impl Pump {
    pub fn new(fuel_type: FuelType, remaining: Decimal) -> Self {
        Self {
            fuel_type,
            remaining,
        }
    }

    pub fn fuel_type(&self) -> FuelType {
        self.fuel_type
    }

    pub fn remaining(&self) -> Decimal {
        self.remaining
    }
}

/// Result of a successful reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispensed {
    /// Pump that served the request.
    pub pump: PumpId,
    /// Stock left in that pump right after dispensing.
    pub remaining: Decimal,
}

#[derive(Debug)]
struct PumpData {
    remaining: Decimal,
}

impl PumpData {
    fn assert_invariants(&self) {
        debug_assert!(
            self.remaining >= Decimal::ZERO,
            "Invariant violated: pump stock went negative: {}",
            self.remaining
        );
    }

    /// Decreases the stock by exactly `amount`.
    fn dispense(&mut self, amount: Decimal) -> Result<(), StationError> {
        if amount <= Decimal::ZERO {
            return Err(StationError::InvalidAmount);
        }
        if self.remaining < amount {
            return Err(StationError::NotEnoughGas);
        }
        self.remaining -= amount;
        self.assert_invariants();
        Ok(())
    }

    /// Puts back fuel taken by a dispense that could not be completed.
    fn restore(&mut self, amount: Decimal) {
        self.remaining += amount;
        self.assert_invariants();
    }
}

#[derive(Debug)]
struct PumpSlot {
    fuel_type: FuelType,
    /// Last published stock. Read without the guard as a pre-filter only.
    observed: AtomicCell<Decimal>,
    /// Authoritative stock. Holding this guard is the reservation.
    data: Mutex<PumpData>,
}

impl PumpSlot {
    fn new(fuel_type: FuelType, stock: Decimal) -> Self {
        Self {
            fuel_type,
            observed: AtomicCell::new(stock),
            data: Mutex::new(PumpData { remaining: stock }),
        }
    }
}

/// Fixed set of pumps, each with its own exclusive guard.
///
/// # Invariants
///
/// - At most one buyer holds a pump at a time.
/// - A buyer never holds more than one pump guard at once.
/// - Stock is only changed while the pump's guard is held, and never below zero.
#[derive(Debug)]
pub struct PumpPool {
    pumps: Vec<PumpSlot>,
    contention: ContentionPolicy,
}

impl PumpPool {
    pub fn new(contention: ContentionPolicy) -> Self {
        Self {
            pumps: Vec::new(),
            contention,
        }
    }

    /// Appends a pump with `stock` units of `fuel_type`.
    ///
    /// Takes `&mut self`: pumps can only be added while nobody else holds
    /// the pool.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InvalidAmount`] for a negative stock.
    pub fn add(&mut self, fuel_type: FuelType, stock: Decimal) -> Result<PumpId, StationError> {
        if stock < Decimal::ZERO {
            return Err(StationError::InvalidAmount);
        }
        self.pumps.push(PumpSlot::new(fuel_type, stock));
        Ok(PumpId(self.pumps.len() - 1))
    }

    pub fn len(&self) -> usize {
        self.pumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pumps.is_empty()
    }

    /// Returns a detached copy of every pump, in insertion order.
    pub fn snapshot(&self) -> Vec<Pump> {
        self.pumps
            .iter()
            .map(|slot| Pump::new(slot.fuel_type, slot.observed.load()))
            .collect()
    }

    /// Finds a pump of `fuel_type` holding at least `amount`, reserves it,
    /// and dispenses `amount` from it.
    ///
    /// Busy pumps are never waited on; the pool is rescanned while at least
    /// one pump could still serve the request. There is no bound on the
    /// number of rescans.
    ///
    /// # Errors
    ///
    /// - [`StationError::InvalidAmount`] - `amount` is not positive.
    /// - [`StationError::NotEnoughGas`] - every pump has the wrong type or too little stock.
    pub fn dispense(&self, fuel_type: FuelType, amount: Decimal) -> Result<Dispensed, StationError> {
        if amount <= Decimal::ZERO {
            return Err(StationError::InvalidAmount);
        }

        // Per-request mask; a pump ruled out here is not looked at again by this request.
        let mut usable = vec![true; self.pumps.len()];
        let mut pass = 0u64;

        loop {
            for (index, slot) in self.pumps.iter().enumerate() {
                if !usable[index] {
                    continue;
                }
                if slot.fuel_type != fuel_type || slot.observed.load() < amount {
                    usable[index] = false;
                    continue;
                }

                let Some(mut data) = slot.data.try_lock() else {
                    continue;
                };

                // The pre-filter read may be stale.
                if data.dispense(amount).is_err() {
                    usable[index] = false;
                    continue;
                }
                slot.observed.store(data.remaining);

                return Ok(Dispensed {
                    pump: PumpId(index),
                    remaining: data.remaining,
                });
            }

            if !usable.iter().any(|candidate| *candidate) {
                return Err(StationError::NotEnoughGas);
            }

            pass += 1;
            trace!(fuel = %fuel_type, amount = %amount, pass, "all candidate pumps busy, rescanning");
            self.contention.pause();
        }
    }

    /// Undoes a [`dispense`](Self::dispense) whose sale could not be recorded.
    ///
    /// Waits for the pump's guard; the caller must not hold any other lock.
    pub(crate) fn restore(&self, dispensed: &Dispensed, amount: Decimal) {
        let Some(slot) = self.pumps.get(dispensed.pump.0) else {
            return;
        };
        let mut data = slot.data.lock();
        data.restore(amount);
        slot.observed.store(data.remaining);
    }
}

impl Default for PumpPool {
    fn default() -> Self {
        Self::new(ContentionPolicy::default())
    }
}
