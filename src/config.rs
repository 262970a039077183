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

//! Ledger configuration.
//!
//! # Example
//!
//! ```
//! use bank_transfer_rs::LedgerConfig;
//! use std::time::Duration;
//!
//! let config = LedgerConfig {
//!     processing_delay_ms: 100,
//!     lock_timeout_ms: Some(500),
//! };
//! assert_eq!(config.lock_timeout(), Some(Duration::from_millis(500)));
//! ```

use crate::processing::{FixedDelay, NoDelay, ProcessingCost};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Tunables for a [`Ledger`](crate::Ledger).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Time spent holding an account lock before each balance change.
    pub processing_delay_ms: u64,
    /// Upper bound on waiting for an account lock before any effect.
    /// `None` waits indefinitely.
    pub lock_timeout_ms: Option<u64>,
}

impl LedgerConfig {
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Builds the processing cost hook described by this configuration.
    pub fn processing_cost(&self) -> Arc<dyn ProcessingCost> {
        match self.processing_delay_ms {
            0 => Arc::new(NoDelay),
            _ => Arc::new(FixedDelay::new(self.processing_delay())),
        }
    }
}
