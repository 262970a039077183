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

//! Account registry.
//!
//! The [`Ledger`] maps account names to shared [`Account`] handles and runs
//! every operation through its [`Teller`].
//!
//! # Thread Safety
//!
//! Accounts live in a [`DashMap`]. Handles are cloned out of the map before
//! any account lock is taken, so a caller blocked on an account lock never
//! holds a map shard lock as well.

use crate::TransferError;
use crate::account::Account;
use crate::base::{AccountName, CallerId};
use crate::config::LedgerConfig;
use crate::teller::{Teller, TransferReceipt};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// In-memory ledger of named accounts.
///
/// # Invariants
///
/// - Account names are unique within a ledger.
/// - At most one account lock is held by any ledger operation at a time.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<AccountName, Arc<Account>>,
    teller: Teller,
}

impl Ledger {
    /// Creates an empty ledger with no processing cost and no lock timeout.
    pub fn new() -> Self {
        Self::with_teller(Teller::new())
    }

    pub fn with_config(config: &LedgerConfig) -> Self {
        Self::with_teller(Teller::with_config(config))
    }

    pub fn with_teller(teller: Teller) -> Self {
        Ledger {
            accounts: DashMap::new(),
            teller,
        }
    }

    /// Opens a new account.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidAmount`] - `initial_balance` is negative.
    /// - [`TransferError::DuplicateAccount`] - `name` is already registered.
    pub fn open(
        &self,
        name: impl Into<AccountName>,
        initial_balance: Decimal,
    ) -> Result<Arc<Account>, TransferError> {
        let account = Arc::new(Account::new(name, initial_balance)?);

        // Entry API keeps check-and-insert atomic.
        match self.accounts.entry(account.name().clone()) {
            Entry::Occupied(_) => Err(TransferError::DuplicateAccount),
            Entry::Vacant(entry) => {
                info!(account = %account.name(), balance = %initial_balance, "account opened");
                entry.insert(Arc::clone(&account));
                Ok(account)
            }
        }
    }

    /// Returns a handle to the named account, if registered.
    pub fn get_account(&self, name: &str) -> Option<Arc<Account>> {
        self.accounts.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns handles to all accounts, ordered by name.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<_> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_by(|a, b| a.name().cmp(b.name()));
        accounts
    }

    /// Transfers `amount` between two named accounts.
    ///
    /// See [`Teller::transfer`] for the locking protocol.
    ///
    /// # Errors
    ///
    /// [`TransferError::AccountNotFound`] if either name is unknown, otherwise
    /// any error of [`Teller::transfer`].
    pub fn transfer(
        &self,
        caller: &CallerId,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt, TransferError> {
        let from = self.require(from)?;
        let to = self.require(to)?;
        self.teller.transfer(caller, &from, &to, amount)
    }

    /// Withdraws from the named account and returns its new balance.
    pub fn withdraw(
        &self,
        caller: &CallerId,
        name: &str,
        amount: Decimal,
    ) -> Result<Decimal, TransferError> {
        let account = self.require(name)?;
        self.teller.withdraw(caller, &account, amount)
    }

    /// Deposits into the named account and returns its new balance.
    pub fn deposit(
        &self,
        caller: &CallerId,
        name: &str,
        amount: Decimal,
    ) -> Result<Decimal, TransferError> {
        let account = self.require(name)?;
        self.teller.deposit(caller, &account, amount)
    }

    pub fn balance(&self, caller: &CallerId, name: &str) -> Result<Decimal, TransferError> {
        let account = self.require(name)?;
        self.teller.balance(caller, &account)
    }

    /// Sums all balances.
    ///
    /// Each balance is read under its own lock, one account at a time. While
    /// transfers are running the result may miss amounts that are in flight.
    pub fn total(&self) -> Decimal {
        self.accounts().iter().map(|account| account.balance()).sum()
    }

    fn require(&self, name: &str) -> Result<Arc<Account>, TransferError> {
        self.get_account(name).ok_or(TransferError::AccountNotFound)
    }
}
