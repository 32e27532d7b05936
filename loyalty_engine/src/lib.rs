//! Loyalty Engine
//!
//! The loyalty engine credits user accounts for purchase orders. Orders are submitted by users, confirmed
//! asynchronously by an external accrual service, and the accrual is then added to the owner's balance. Users can
//! spend their balance by withdrawing points against new orders.
//!
//! The library is divided into the following sections:
//! 1. Storage ([`mod@traits`], [`mod@sqlite`] and [`mod@memory`]). The traits describe what a backend must provide.
//!    SQLite is the production backend; the memory backend is a drop-in double for tests. Data types are defined in
//!    [`mod@db_types`].
//! 2. The public API ([`EnrollmentApi`], [`WithdrawApi`] and [`AccountApi`]). You should never need to talk to a
//!    backend directly.
//! 3. Reconciliation ([`mod@reconciliation`] and [`mod@accrual`]). A single worker drains a bounded queue of newly
//!    submitted orders, polls the accrual service and settles each order in one ledger transaction.
//!
//! The engine also emits events when an order is processed, invalidated or given up on. A simple actor framework
//! ([`mod@events`]) lets you hook into these and perform custom actions.
pub mod accrual;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod memory;
pub mod reconciliation;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

mod lpe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use accrual::{AccrualClient, AccrualService};
pub use lpe_api::{AccountApi, EnrollmentApi, EnrollmentError, WithdrawApi, WithdrawError};
pub use memory::MemoryDatabase;
pub use reconciliation::{reconciliation_queue, ReconciliationQueue, ReconciliationWorker, RetryPolicy};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountApiError,
    LedgerManagement,
    OrderManagement,
    OrderManagementError,
    TransactionError,
    TransactionRunner,
    WithdrawalManagement,
};
