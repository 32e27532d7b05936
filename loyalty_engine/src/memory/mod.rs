//! A map-backed storage backend.
//!
//! [`MemoryDatabase`] implements the same traits as the SQLite backend and enforces the same constraints (unique order
//! numbers, absorbing terminal states, non-negative balances), so the engine APIs and the reconciliation worker can be
//! exercised without a database file. It can also be told to fail the next few operations, which is how the retry
//! paths are tested.
mod state;
mod transaction;

use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::sync::Mutex;
pub use transaction::MemoryTransaction;

use self::state::MemoryState;
use crate::{
    db_types::{Cents, NewOrder, Order, OrderNumber, OrderStatusType, UserAccount, Withdrawal},
    traits::{
        AccountApiError,
        LedgerManagement,
        OrderManagement,
        OrderManagementError,
        TransactionError,
        TransactionRunner,
        WithdrawalManagement,
    },
};

#[derive(Debug, Default)]
pub(crate) struct Faults {
    status_updates: AtomicUsize,
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl Faults {
    /// Consumes one pending failure from `counter`, returning `true` if the caller should fail.
    fn take(&self, counter: &AtomicUsize) -> bool {
        counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
    }
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryDatabase")
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` calls to [`OrderManagement::update_order_status`] fail with a database error.
    pub fn fail_next_status_updates(&self, n: usize) {
        self.faults.status_updates.store(n, Ordering::SeqCst);
    }

    /// The next `n` calls to [`TransactionRunner::begin`] fail with a database error.
    pub fn fail_next_transactions(&self, n: usize) {
        self.faults.begins.store(n, Ordering::SeqCst);
    }

    /// The next `n` commits fail. The changes made in those transactions are discarded.
    pub fn fail_next_commits(&self, n: usize) {
        self.faults.commits.store(n, Ordering::SeqCst);
    }

    /// The next `n` rollbacks report a failure.
    pub fn fail_next_rollbacks(&self, n: usize) {
        self.faults.rollbacks.store(n, Ordering::SeqCst);
    }
}

impl OrderManagement for MemoryDatabase {
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderManagementError> {
        Ok(self.state.lock().await.order(number))
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        self.state.lock().await.insert_order(order)
    }

    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> Result<Order, OrderManagementError> {
        if self.faults.take(&self.faults.status_updates) {
            return Err(OrderManagementError::DatabaseError("injected status update failure".into()));
        }
        self.state.lock().await.update_order_status(number, status)
    }

    async fn update_order_accrual(&self, number: &OrderNumber, accrual: Cents) -> Result<Order, OrderManagementError> {
        self.state.lock().await.update_order_accrual(number, accrual)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError> {
        Ok(self.state.lock().await.orders_where(|o| o.user_id == user_id))
    }

    async fn fetch_unresolved_orders(&self) -> Result<Vec<Order>, OrderManagementError> {
        Ok(self.state.lock().await.orders_where(|o| !o.status.is_terminal()))
    }
}

impl LedgerManagement for MemoryDatabase {
    async fn fetch_account(&self, id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        Ok(self.state.lock().await.account(id))
    }

    async fn fetch_account_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        Ok(self.state.lock().await.account_by_login(login))
    }

    async fn fetch_or_create_account(&self, login: &str) -> Result<UserAccount, AccountApiError> {
        Ok(self.state.lock().await.fetch_or_create_account(login))
    }
}

impl WithdrawalManagement for MemoryDatabase {
    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        Ok(self.state.lock().await.withdrawals_for_user(user_id))
    }

    async fn fetch_withdrawn_sum_for_user(&self, user_id: i64) -> Result<Cents, AccountApiError> {
        Ok(self.state.lock().await.withdrawals_for_user(user_id).into_iter().map(|w| w.sum).sum())
    }
}

impl TransactionRunner for MemoryDatabase {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, TransactionError> {
        if self.faults.take(&self.faults.begins) {
            return Err(TransactionError::DatabaseError("injected failure starting transaction".into()));
        }
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(MemoryTransaction::new(guard, Arc::clone(&self.faults)))
    }
}
