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

//! Error types for ledger operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Ledger operation errors.
///
/// Every variant except [`TransferError::RefundFailed`] means the operation
/// left all balances exactly as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Amount is negative
    #[error("invalid amount (must not be negative)")]
    InvalidAmount,

    /// Withdrawal would take the balance below zero
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Source and destination of a transfer are the same account
    #[error("cannot transfer between an account and itself")]
    SameAccount,

    /// Account lock was not acquired within the configured timeout
    #[error("timed out waiting for account lock")]
    LockTimeout,

    /// No account is registered under the given name
    #[error("account not found")]
    AccountNotFound,

    /// An account with the same name is already registered
    #[error("account already exists")]
    DuplicateAccount,

    /// Deposit would exceed the representable balance
    #[error("balance overflow")]
    BalanceOverflow,

    /// A failed transfer could not return the withdrawn amount to its source
    #[error("refund of {amount} failed, amount is in neither account")]
    RefundFailed { amount: Decimal },
}
