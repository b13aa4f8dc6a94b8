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

//! Station configuration.
//!
//! # Example
//!
//! ```
//! use gas_station_rs::{ContentionPolicy, StationConfig, UnpricedFuelPolicy};
//!
//! let config = StationConfig {
//!     unpriced_fuel: UnpricedFuelPolicy::Reject,
//!     contention: ContentionPolicy::Yield,
//! };
//! assert_ne!(config, StationConfig::default());
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a purchase of a fuel type without a configured price is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnpricedFuelPolicy {
    /// The fuel costs 0 and is never too expensive.
    #[default]
    Free,
    /// The purchase fails with [`StationError::PriceNotSet`](crate::StationError::PriceNotSet).
    Reject,
}

/// What a buyer does between scan passes when every candidate pump was busy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContentionPolicy {
    /// Busy-retry with a CPU spin hint.
    #[default]
    Spin,
    /// Give up the time slice before retrying.
    Yield,
}

impl ContentionPolicy {
    pub(crate) fn pause(&self) {
        match self {
            Self::Spin => std::hint::spin_loop(),
            Self::Yield => std::thread::yield_now(),
        }
    }
}

/// Station-wide settings, fixed for the station's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    pub unpriced_fuel: UnpricedFuelPolicy,
    pub contention: ContentionPolicy,
}
