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

//! Locking orchestration for single-account and two-account operations.
//!
//! # Two-phase transfers
//!
//! A [`Teller`] never holds more than one account lock at a time. A transfer
//! locks the source, withdraws, and releases it before it locks the
//! destination and deposits. Two transfers running in opposite directions
//! therefore can never wait on each other in a cycle, whatever order they
//! run in.
//!
//! ```text
//!  from: lock ─► cost ─► withdraw ─► unlock
//!                                        │
//!    to:                                 └─► lock ─► cost ─► deposit ─► unlock
//! ```
//!
//! Between the two phases the amount is in flight: it has left `from` but
//! not yet reached `to`, so a concurrent reader may observe a sum of both
//! balances that is temporarily lower.

use crate::TransferError;
use crate::account::{Account, AccountGuard};
use crate::base::{AccountName, CallerId};
use crate::config::LedgerConfig;
use crate::processing::{NoDelay, ProcessingCost};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub from: AccountName,
    pub to: AccountName,
    pub amount: Decimal,
    /// Source balance right after the withdrawal.
    pub from_balance: Decimal,
    /// Destination balance right after the deposit.
    pub to_balance: Decimal,
}

/// Applies balance changes to accounts under their locks.
#[derive(Debug, Clone)]
pub struct Teller {
    processing: Arc<dyn ProcessingCost>,
    lock_timeout: Option<Duration>,
}

impl Teller {
    /// Creates a teller with no processing cost and no lock timeout.
    pub fn new() -> Self {
        Self {
            processing: Arc::new(NoDelay),
            lock_timeout: None,
        }
    }

    pub fn with_config(config: &LedgerConfig) -> Self {
        Self {
            processing: config.processing_cost(),
            lock_timeout: config.lock_timeout(),
        }
    }

    pub fn with_processing_cost(mut self, processing: Arc<dyn ProcessingCost>) -> Self {
        self.processing = processing;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Moves `amount` from `from` to `to` in two independently locked phases.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidAmount`] - `amount` is negative. No lock is taken.
    /// - [`TransferError::SameAccount`] - `from` and `to` are the same account.
    ///   No lock is taken.
    /// - [`TransferError::LockTimeout`] - `from`'s lock was not acquired in time.
    /// - [`TransferError::InsufficientFunds`] - `from` cannot cover `amount`.
    /// - [`TransferError::BalanceOverflow`] - `to` cannot hold the deposit. The
    ///   amount is returned to `from`.
    /// - [`TransferError::RefundFailed`] - `to` cannot hold the deposit and `from`
    ///   can no longer take the amount back. The amount is in neither account.
    ///
    /// Every error except `RefundFailed` leaves both balances unchanged.
    pub fn transfer(
        &self,
        caller: &CallerId,
        from: &Account,
        to: &Account,
        amount: Decimal,
    ) -> Result<TransferReceipt, TransferError> {
        validate_amount(amount)?;
        if std::ptr::eq(from, to) || from.name() == to.name() {
            warn!(%caller, account = %from.name(), "transfer to same account rejected");
            return Err(TransferError::SameAccount);
        }

        info!(%caller, from = %from.name(), to = %to.name(), %amount, "transferring");

        // Phase 1: the guard is dropped at the end of `withdraw_locked`.
        let from_balance = self.withdraw_locked(caller, from, self.acquire(caller, from)?, amount)?;

        // Phase 2 blocks regardless of the timeout: the amount is in flight
        // and no other account lock is held.
        let to_balance = match self.deposit_locked(caller, to, to.lock(), amount) {
            Ok(balance) => balance,
            Err(e) => {
                self.refund(caller, from, amount)?;
                return Err(e);
            }
        };

        info!(%caller, from = %from.name(), to = %to.name(), %amount, "transfer complete");
        Ok(TransferReceipt {
            from: from.name().clone(),
            to: to.name().clone(),
            amount,
            from_balance,
            to_balance,
        })
    }

    /// Withdraws `amount` from a single account.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidAmount`] - `amount` is negative. No lock is taken.
    /// - [`TransferError::LockTimeout`] - the lock was not acquired in time.
    /// - [`TransferError::InsufficientFunds`] - the balance cannot cover `amount`.
    pub fn withdraw(
        &self,
        caller: &CallerId,
        account: &Account,
        amount: Decimal,
    ) -> Result<Decimal, TransferError> {
        validate_amount(amount)?;
        info!(%caller, account = %account.name(), %amount, "withdrawing");
        let guard = self.acquire(caller, account)?;
        self.withdraw_locked(caller, account, guard, amount)
    }

    /// Deposits `amount` into a single account.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidAmount`] - `amount` is negative. No lock is taken.
    /// - [`TransferError::LockTimeout`] - the lock was not acquired in time.
    /// - [`TransferError::BalanceOverflow`] - the sum is not representable.
    pub fn deposit(
        &self,
        caller: &CallerId,
        account: &Account,
        amount: Decimal,
    ) -> Result<Decimal, TransferError> {
        validate_amount(amount)?;
        info!(%caller, account = %account.name(), %amount, "depositing");
        let guard = self.acquire(caller, account)?;
        self.deposit_locked(caller, account, guard, amount)
    }

    /// Reads the balance under the account lock.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::LockTimeout`] if the lock was not acquired in time.
    pub fn balance(&self, caller: &CallerId, account: &Account) -> Result<Decimal, TransferError> {
        Ok(self.acquire(caller, account)?.balance())
    }

    fn acquire<'a>(
        &self,
        caller: &CallerId,
        account: &'a Account,
    ) -> Result<AccountGuard<'a>, TransferError> {
        let guard = match self.lock_timeout {
            Some(timeout) => account.try_lock_for(timeout).ok_or_else(|| {
                warn!(%caller, account = %account.name(), ?timeout, "lock timeout");
                TransferError::LockTimeout
            })?,
            None => account.lock(),
        };
        debug!(%caller, account = %account.name(), "lock acquired");
        Ok(guard)
    }

    fn withdraw_locked(
        &self,
        caller: &CallerId,
        account: &Account,
        mut guard: AccountGuard<'_>,
        amount: Decimal,
    ) -> Result<Decimal, TransferError> {
        self.processing.charge(account.name());
        match guard.withdraw(amount) {
            Ok(balance) => {
                info!(%caller, account = %account.name(), %amount, %balance, "withdrawn");
                Ok(balance)
            }
            Err(e) => {
                warn!(
                    %caller,
                    account = %account.name(),
                    %amount,
                    balance = %guard.balance(),
                    error = %e,
                    "withdrawal failed"
                );
                Err(e)
            }
        }
    }

    fn deposit_locked(
        &self,
        caller: &CallerId,
        account: &Account,
        mut guard: AccountGuard<'_>,
        amount: Decimal,
    ) -> Result<Decimal, TransferError> {
        self.processing.charge(account.name());
        match guard.deposit(amount) {
            Ok(balance) => {
                info!(%caller, account = %account.name(), %amount, %balance, "deposited");
                Ok(balance)
            }
            Err(e) => {
                warn!(%caller, account = %account.name(), %amount, error = %e, "deposit failed");
                Err(e)
            }
        }
    }

    /// Returns an in-flight amount to the account it was withdrawn from.
    fn refund(
        &self,
        caller: &CallerId,
        account: &Account,
        amount: Decimal,
    ) -> Result<(), TransferError> {
        match account.lock().deposit(amount) {
            Ok(balance) => {
                warn!(%caller, account = %account.name(), %amount, %balance, "transfer refunded");
                Ok(())
            }
            Err(e) => {
                error!(%caller, account = %account.name(), %amount, error = %e, "refund failed");
                Err(TransferError::RefundFailed { amount })
            }
        }
    }
}

impl Default for Teller {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_amount(amount: Decimal) -> Result<(), TransferError> {
    // Also rejects negative zero, which compares equal to zero.
    if amount.is_sign_negative() {
        return Err(TransferError::InvalidAmount);
    }
    Ok(())
}
