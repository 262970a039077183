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

//! Account public API integration tests.

use bank_transfer_rs::{Account, AccountName, TransferError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

// === Basic Account Tests ===

#[test]
fn new_account_holds_initial_balance() {
    let account = Account::new("Account-A", dec!(1000.00)).unwrap();
    assert_eq!(account.name(), &AccountName::from("Account-A"));
    assert_eq!(account.balance(), dec!(1000.00));
}

#[test]
fn new_account_may_start_empty() {
    let account = Account::new("Account-A", Decimal::ZERO).unwrap();
    assert_eq!(account.balance(), Decimal::ZERO);
}

#[test]
fn withdraw_under_lock() {
    let account = Account::new("Account-A", dec!(1000.00)).unwrap();
    let balance = account.lock().withdraw(dec!(200.00)).unwrap();
    assert_eq!(balance, dec!(800.00));
    assert_eq!(account.balance(), dec!(800.00));
}

#[test]
fn deposit_under_lock() {
    let account = Account::new("Account-B", dec!(500.00)).unwrap();
    let balance = account.lock().deposit(dec!(200.00)).unwrap();
    assert_eq!(balance, dec!(700.00));
}

#[test]
fn overdraw_reports_failure_and_keeps_balance() {
    let account = Account::new("Account-A", dec!(100.00)).unwrap();
    let before = account.balance();

    let result = account.lock().withdraw(dec!(150.00));

    assert_eq!(result, Err(TransferError::InsufficientFunds));
    let after = account.balance();
    assert_eq!(after, before);
    assert_eq!(after.serialize(), before.serialize());
}

#[test]
fn sequence_of_operations_under_one_guard() {
    let account = Account::new("Account-A", dec!(10.00)).unwrap();
    {
        let mut data = account.lock();
        data.deposit(dec!(5.00)).unwrap();
        data.withdraw(dec!(12.00)).unwrap();
        assert_eq!(data.withdraw(dec!(3.01)), Err(TransferError::InsufficientFunds));
        assert_eq!(data.balance(), dec!(3.00));
    }
    assert_eq!(account.balance(), dec!(3.00));
}

// === Locking Tests ===

#[test]
fn balance_read_waits_for_writer() {
    let account = Arc::new(Account::new("Account-A", dec!(100.00)).unwrap());
    let mut guard = account.lock();

    let reader = {
        let account = Arc::clone(&account);
        thread::spawn(move || account.balance())
    };

    thread::sleep(Duration::from_millis(50));
    guard.withdraw(dec!(40.00)).unwrap();
    drop(guard);

    // The reader could only observe the balance after the lock was released.
    assert_eq!(reader.join().unwrap(), dec!(60.00));
}

#[test]
fn try_lock_for_succeeds_when_free() {
    let account = Account::new("Account-A", dec!(1.00)).unwrap();
    let guard = account.try_lock_for(Duration::from_millis(10));
    assert!(guard.is_some());
}

// === Concurrency Tests ===

#[test]
fn concurrent_deposits_are_not_lost() {
    let account = Arc::new(Account::new("Account-A", Decimal::ZERO).unwrap());
    let mut handles = vec![];

    for _ in 0..10 {
        let account = Arc::clone(&account);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                account.lock().deposit(dec!(1.00)).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(account.balance(), dec!(1000.00));
}

#[test]
fn concurrent_withdrawals_only_one_succeeds() {
    let account = Arc::new(Account::new("Account-A", dec!(1000.00)).unwrap());
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let account = Arc::clone(&account);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                account.lock().withdraw(dec!(600.00))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results.contains(&Err(TransferError::InsufficientFunds)));
    assert!(results.contains(&Ok(dec!(400.00))));
    assert_eq!(account.balance(), dec!(400.00));
}
