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

//! Account management.
//!
//! An [`Account`] owns exactly one lock. Balance mutation lives on
//! [`AccountData`], which is only reachable through that lock's guard, so
//! `withdraw` and `deposit` cannot be called without holding it.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use bank_transfer_rs::Account;
//!
//! let account = Account::new("Account-A", dec!(100.00)).unwrap();
//! assert_eq!(account.lock().withdraw(dec!(30.00)), Ok(dec!(70.00)));
//! assert_eq!(account.balance(), dec!(70.00));
//! ```

use crate::TransferError;
use crate::base::AccountName;
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::time::Duration;

/// Exclusive access to an account's balance.
///
/// Dropping the guard releases the account lock.
pub type AccountGuard<'a> = MutexGuard<'a, AccountData>;

/// Balance state protected by the account lock.
#[derive(Debug)]
pub struct AccountData {
    balance: Decimal,
}

impl AccountData {
    fn new(balance: Decimal) -> Self {
        Self { balance }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Decreases the balance and returns the new value.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidAmount`] - `amount` is negative.
    /// - [`TransferError::InsufficientFunds`] - `amount` exceeds the balance.
    ///   The balance is left untouched.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<Decimal, TransferError> {
        if amount.is_sign_negative() {
            return Err(TransferError::InvalidAmount);
        }
        if self.balance < amount {
            return Err(TransferError::InsufficientFunds);
        }
        self.balance -= amount;
        self.assert_invariants();
        Ok(self.balance)
    }

    /// Increases the balance and returns the new value.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidAmount`] - `amount` is negative.
    /// - [`TransferError::BalanceOverflow`] - the sum is not representable.
    pub fn deposit(&mut self, amount: Decimal) -> Result<Decimal, TransferError> {
        if amount.is_sign_negative() {
            return Err(TransferError::InvalidAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow)?;
        self.assert_invariants();
        Ok(self.balance)
    }
}

/// Ledger account.
///
/// The name is immutable and readable without locking. The balance is only
/// reachable through [`Account::lock`] or [`Account::try_lock_for`].
#[derive(Debug)]
pub struct Account {
    name: AccountName,
    inner: Mutex<AccountData>,
}

impl Account {
    const DECIMAL_PRECISION: u32 = 2;

    /// Creates an account holding `initial_balance`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidAmount`] if `initial_balance` is negative.
    pub fn new(
        name: impl Into<AccountName>,
        initial_balance: Decimal,
    ) -> Result<Self, TransferError> {
        if initial_balance.is_sign_negative() {
            return Err(TransferError::InvalidAmount);
        }
        Ok(Self {
            name: name.into(),
            inner: Mutex::new(AccountData::new(initial_balance)),
        })
    }

    pub fn name(&self) -> &AccountName {
        &self.name
    }

    /// Returns a snapshot of the balance, taken under the account lock.
    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    /// Blocks until the account lock is acquired.
    pub fn lock(&self) -> AccountGuard<'_> {
        self.inner.lock()
    }

    /// Waits at most `timeout` for the account lock.
    pub fn try_lock_for(&self, timeout: Duration) -> Option<AccountGuard<'_>> {
        self.inner.try_lock_for(timeout)
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut balance = self.balance().round_dp(Account::DECIMAL_PRECISION);
        balance.rescale(Account::DECIMAL_PRECISION);

        let mut state = serializer.serialize_struct("Account", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("balance", &balance)?;
        state.end()
    }
}
