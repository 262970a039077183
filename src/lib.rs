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

//! # Bank Transfer
//!
//! A thread-safe, in-memory ledger of named accounts supporting withdraw,
//! deposit and transfer under concurrent access, with deadlock avoidance and
//! insufficient-funds handling.
//!
//! ## Core Components
//!
//! - [`Account`]: Named balance guarded by its own lock
//! - [`Teller`]: Locking orchestration for withdraw, deposit and transfer
//! - [`Ledger`]: Registry addressing accounts by name
//! - [`ProcessingCost`]: Work performed while an account lock is held
//! - [`TransferError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use bank_transfer_rs::{CallerId, Ledger, TransferError};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new();
//! ledger.open("Account-A", dec!(1000.00)).unwrap();
//! ledger.open("Account-B", dec!(500.00)).unwrap();
//!
//! let caller = CallerId::from("teller-1");
//! ledger.transfer(&caller, "Account-A", "Account-B", dec!(200.00)).unwrap();
//! ledger.withdraw(&caller, "Account-B", dec!(150.00)).unwrap();
//!
//! assert_eq!(ledger.balance(&caller, "Account-A"), Ok(dec!(800.00)));
//! assert_eq!(ledger.balance(&caller, "Account-B"), Ok(dec!(550.00)));
//! assert_eq!(
//!     ledger.withdraw(&caller, "Account-B", dec!(1000.00)),
//!     Err(TransferError::InsufficientFunds)
//! );
//! ```
//!
//! ## Thread Safety
//!
//! Each account has exactly one lock and no operation ever holds two of them,
//! so transfers in opposite directions cannot deadlock.

pub mod account;
mod base;
pub mod config;
pub mod error;
mod ledger;
pub mod logging;
pub mod processing;
mod teller;

pub use account::{Account, AccountData, AccountGuard};
pub use base::{AccountName, CallerId};
pub use config::LedgerConfig;
pub use error::TransferError;
pub use ledger::Ledger;
pub use processing::{FixedDelay, NoDelay, ProcessingCost};
pub use teller::{Teller, TransferReceipt};
