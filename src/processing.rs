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

//! Simulated processing cost.
//!
//! A [`ProcessingCost`] runs while an account lock is held, right before the
//! balance is mutated. It stretches the lock hold time so contention between
//! concurrent callers becomes observable. Tests swap in [`NoDelay`] or a
//! closure to run at full speed or to inspect the locked account.

use crate::base::AccountName;
use std::fmt;
use std::thread;
use std::time::Duration;

/// Work performed while holding an account lock.
pub trait ProcessingCost: Send + Sync {
    fn charge(&self, account: &AccountName);
}

/// Charges nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl ProcessingCost for NoDelay {
    fn charge(&self, _account: &AccountName) {}
}

/// Sleeps for a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(Duration);

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self(delay)
    }

    pub fn delay(&self) -> Duration {
        self.0
    }
}

impl ProcessingCost for FixedDelay {
    fn charge(&self, _account: &AccountName) {
        thread::sleep(self.0);
    }
}

impl<F> ProcessingCost for F
where
    F: Fn(&AccountName) + Send + Sync,
{
    fn charge(&self, account: &AccountName) {
        self(account)
    }
}

impl fmt::Debug for dyn ProcessingCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProcessingCost")
    }
}
