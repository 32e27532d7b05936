//! # Order reconciliation
//!
//! Newly submitted orders are pushed onto a bounded [`ReconciliationQueue`]. A single [`ReconciliationWorker`] owns the
//! receiving end and drives each order to a terminal state:
//!
//! 1. The order is marked `PROCESSING`.
//! 2. The accrual service is polled until it reports `INVALID` or `PROCESSED`, backing off as the [`RetryPolicy`]
//!    dictates.
//! 3. Invalid orders are marked `INVALID`. Processed orders are credited in a single ledger transaction that records the
//!    accrual, marks the order `PROCESSED` and adds the accrual to the owner's balance.
//!
//! Only one order is in flight at a time, so the same order can never be reconciled twice concurrently. Orders the
//! worker cannot finish are either put back at the end of the line or dead-lettered. They are never silently dropped,
//! and anything left unresolved is picked up again by the startup recovery pass.
mod policy;
mod queue;
mod worker;

pub use policy::{
    RetryPolicy,
    DEFAULT_MAX_NETWORK_FAILURES,
    DEFAULT_MAX_POLLS_PER_VISIT,
    DEFAULT_PERSISTENCE_RETRY_DELAY,
    DEFAULT_POLL_INTERVAL,
    DEFAULT_QUEUE_CAPACITY,
    DEFAULT_REQUEUE_DELAY,
    MISSING_ORDER_LOOKUPS,
};
pub use queue::{reconciliation_queue, QueueClosed, ReconciliationQueue, ReconciliationReceiver, ReconciliationTask};
pub use worker::ReconciliationWorker;
