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

use bank_transfer_rs::{CallerId, Ledger, LedgerConfig, TransferError, logging};
use clap::{Parser, Subcommand};
use crossbeam::channel;
use csv::Writer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use std::process;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{error, info, warn};

const ACCOUNT_A: &str = "Account-A";
const ACCOUNT_B: &str = "Account-B";

/// Bank Transfer - Concurrent transfers between locked accounts
///
/// Opens Account-A with $1000.00 and Account-B with $500.00, runs the chosen
/// simulation on worker threads and writes the final balances as CSV to
/// stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "bank-transfer-rs")]
#[command(about = "Simulates concurrent transfers between bank accounts", long_about = None)]
struct Args {
    /// Simulated processing time while holding an account lock, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100)]
    delay_ms: u64,

    /// Give up waiting for an account lock after this many milliseconds
    #[arg(long, value_name = "MS")]
    lock_timeout_ms: Option<u64>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Transfer $200 from Account-A to Account-B, then withdraw $150 from Account-B
    Demo,
    /// Run concurrent transfers alternating between A → B and B → A
    Stress {
        /// Number of concurrent transfers
        #[arg(long, default_value_t = 100)]
        transfers: usize,

        /// Amount moved by each transfer
        #[arg(long, default_value = "10")]
        amount: Decimal,
    },
}

/// Failures that abort a simulation.
#[derive(Error, Debug)]
enum DriverError {
    #[error("ledger error: {0}")]
    Ledger(#[from] TransferError),

    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker thread '{0}' panicked")]
    WorkerPanicked(String),

    #[error("balance not conserved: expected {expected}, found {actual}")]
    NotConserved { expected: Decimal, actual: Decimal },
}

/// Outcome counts of a stress run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct StressSummary {
    completed: usize,
    rejected: usize,
}

fn main() {
    let args = Args::parse();
    logging::init_logging(&args.log_level, args.json_logs);

    let config = LedgerConfig {
        processing_delay_ms: args.delay_ms,
        lock_timeout_ms: args.lock_timeout_ms,
    };
    let ledger = Arc::new(Ledger::with_config(&config));

    let result = match args.command.unwrap_or(Command::Demo) {
        Command::Demo => run_demo(&ledger),
        Command::Stress { transfers, amount } => {
            run_stress(&ledger, transfers, amount).map(|summary| {
                info!(
                    completed = summary.completed,
                    rejected = summary.rejected,
                    total = %ledger.total(),
                    "stress run finished"
                );
            })
        }
    };

    if let Err(e) = result {
        error!(error = %e, "simulation failed");
        process::exit(1);
    }

    if let Err(e) = write_accounts(&ledger, std::io::stdout()) {
        error!(error = %e, "failed to write report");
        process::exit(1);
    }
}

fn open_accounts(ledger: &Ledger) -> Result<(), TransferError> {
    ledger.open(ACCOUNT_A, dec!(1000.00))?;
    ledger.open(ACCOUNT_B, dec!(500.00))?;
    Ok(())
}

/// Runs `op` on a named worker thread and waits for it.
///
/// Rejected operations are logged and do not abort the run.
fn run_worker<T, F>(ledger: &Arc<Ledger>, caller: &str, op: F) -> Result<Option<T>, DriverError>
where
    T: Send + 'static,
    F: FnOnce(&Ledger, &CallerId) -> Result<T, TransferError> + Send + 'static,
{
    let caller = CallerId::from(caller);
    let ledger = Arc::clone(ledger);
    let handle = thread::Builder::new()
        .name(caller.to_string())
        .spawn({
            let caller = caller.clone();
            move || op(&ledger, &caller)
        })?;

    match handle.join() {
        Ok(Ok(value)) => {
            info!(%caller, "operation complete");
            Ok(Some(value))
        }
        Ok(Err(e)) => {
            warn!(%caller, error = %e, "operation rejected");
            Ok(None)
        }
        Err(_) => Err(DriverError::WorkerPanicked(caller.to_string())),
    }
}

/// Transfers $200 from A to B, waits, then withdraws $150 from B.
fn run_demo(ledger: &Arc<Ledger>) -> Result<(), DriverError> {
    open_accounts(ledger)?;

    run_worker(ledger, "Deposit-Thread (A → B)", |ledger, caller| {
        ledger.transfer(caller, ACCOUNT_A, ACCOUNT_B, dec!(200.00))
    })?;
    run_worker(ledger, "Withdraw-Thread (B)", |ledger, caller| {
        ledger.withdraw(caller, ACCOUNT_B, dec!(150.00))
    })?;

    Ok(())
}

/// Starts `transfers` threads at once, alternating direction, and checks
/// that the combined balance is unchanged once all of them finish.
fn run_stress(
    ledger: &Arc<Ledger>,
    transfers: usize,
    amount: Decimal,
) -> Result<StressSummary, DriverError> {
    open_accounts(ledger)?;
    let expected = ledger.total();

    let (tx, rx) = channel::unbounded();
    let mut handles = Vec::with_capacity(transfers);

    for i in 0..transfers {
        let (from, to) = if i % 2 == 0 {
            (ACCOUNT_A, ACCOUNT_B)
        } else {
            (ACCOUNT_B, ACCOUNT_A)
        };
        let caller = CallerId::new(format!("Transfer-{i} ({from} → {to})"));
        let ledger = Arc::clone(ledger);
        let tx = tx.clone();

        let handle = thread::Builder::new()
            .name(caller.to_string())
            .spawn(move || {
                let result = ledger.transfer(&caller, from, to, amount);
                // Receiver outlives every worker.
                let _ = tx.send((caller, result));
            })?;
        handles.push(handle);
    }
    drop(tx);

    let mut summary = StressSummary::default();
    for (caller, result) in rx {
        match result {
            Ok(_) => summary.completed += 1,
            Err(e) => {
                warn!(%caller, error = %e, "transfer rejected");
                summary.rejected += 1;
            }
        }
    }

    for handle in handles {
        let name = handle.thread().name().unwrap_or_default().to_string();
        handle.join().map_err(|_| DriverError::WorkerPanicked(name))?;
    }

    let actual = ledger.total();
    if actual != expected {
        return Err(DriverError::NotConserved { expected, actual });
    }
    Ok(summary)
}

/// Write account balances to a CSV writer.
///
/// # CSV Format
///
/// Columns: `name, balance`
///
/// ```csv
/// name,balance
/// Account-A,800.00
/// Account-B,550.00
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_accounts<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in ledger.accounts() {
        wtr.serialize(&*account)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Arc<Ledger> {
        Arc::new(Ledger::new())
    }

    #[test]
    fn demo_leaves_expected_balances() {
        let ledger = ledger();
        run_demo(&ledger).unwrap();

        let caller = CallerId::from("test");
        assert_eq!(ledger.balance(&caller, ACCOUNT_A), Ok(dec!(800.00)));
        assert_eq!(ledger.balance(&caller, ACCOUNT_B), Ok(dec!(550.00)));
    }

    #[test]
    fn demo_report_is_csv() {
        let ledger = ledger();
        run_demo(&ledger).unwrap();

        let mut output = Vec::new();
        write_accounts(&ledger, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(
            output_str,
            "name,balance\nAccount-A,800.00\nAccount-B,550.00\n"
        );
    }

    #[test]
    fn demo_fails_on_reused_ledger() {
        let ledger = ledger();
        run_demo(&ledger).unwrap();
        assert!(matches!(
            run_demo(&ledger),
            Err(DriverError::Ledger(TransferError::DuplicateAccount))
        ));
    }

    #[test]
    fn rejected_operation_is_not_fatal() {
        let ledger = ledger();
        open_accounts(&ledger).unwrap();

        let outcome = run_worker(&ledger, "Overdraw", |ledger, caller| {
            ledger.withdraw(caller, ACCOUNT_B, dec!(10000.00))
        })
        .unwrap();

        assert_eq!(outcome, None);
        assert_eq!(ledger.get_account(ACCOUNT_B).unwrap().balance(), dec!(500.00));
    }

    #[test]
    fn stress_conserves_total() {
        let ledger = ledger();
        let summary = run_stress(&ledger, 100, dec!(10)).unwrap();

        assert_eq!(summary.completed + summary.rejected, 100);
        assert_eq!(ledger.total(), dec!(1500.00));
    }

    #[test]
    fn args_default_to_demo() {
        let args = Args::parse_from(["bank-transfer-rs"]);
        assert_eq!(args.delay_ms, 100);
        assert!(args.command.is_none());

        let args = Args::parse_from([
            "bank-transfer-rs",
            "--delay-ms",
            "0",
            "stress",
            "--transfers",
            "4",
            "--amount",
            "2.50",
        ]);
        assert_eq!(args.delay_ms, 0);
        assert!(matches!(
            args.command,
            Some(Command::Stress { transfers: 4, amount }) if amount == dec!(2.50)
        ));
    }
}
