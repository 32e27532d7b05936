//! # Storage backend contracts
//!
//! This module defines the behaviour a storage backend must provide in order to drive the loyalty engine. Every
//! backend (SQLite for production, the in-memory map for tests) implements the same small capability set:
//!
//! * [`OrderManagement`] stores orders and their reconciliation state.
//! * [`LedgerManagement`] provides read access to user accounts and their balances.
//! * [`WithdrawalManagement`] provides read access to the withdrawal history.
//! * [`TransactionRunner`] hands out [`LedgerTransaction`]s. Every mutation of a balance goes through one of these,
//!   so that the order status, the accrual and the owner's balance commit or roll back together.
//!
//! Methods return `impl Future + Send` so that generic consumers, like the reconciliation worker, can be spawned onto
//! the multithreaded runtime. Implementations are free to use `async fn`.
mod data_objects;
mod ledger_management;
mod order_management;
mod transaction;
mod withdrawal_management;

pub use data_objects::{BalanceSummary, CreditOutcome};
pub use ledger_management::{AccountApiError, LedgerManagement};
pub use order_management::{OrderManagement, OrderManagementError};
pub use transaction::{LedgerTransaction, TransactionError, TransactionRunner, TxFuture};
pub use withdrawal_management::WithdrawalManagement;
