use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use super::{state::MemoryState, Faults};
use crate::{
    db_types::{Cents, NewWithdrawal, Order, OrderNumber, OrderStatusType, UserAccount, Withdrawal},
    traits::{LedgerTransaction, TransactionError},
};

/// A transaction against [`MemoryDatabase`](super::MemoryDatabase).
///
/// The transaction holds the store lock for its whole lifetime, which serialises it against every other reader and
/// writer. Changes are made to a private copy of the tables and only swapped in on commit.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Faults>,
}

impl MemoryTransaction {
    pub(crate) fn new(guard: OwnedMutexGuard<MemoryState>, faults: Arc<Faults>) -> Self {
        let working = guard.clone();
        Self { guard, working, faults }
    }
}

impl LedgerTransaction for MemoryTransaction {
    async fn fetch_order(&mut self, number: &OrderNumber) -> Result<Option<Order>, TransactionError> {
        Ok(self.working.order(number))
    }

    async fn update_order_status(
        &mut self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> Result<Order, TransactionError> {
        Ok(self.working.update_order_status(number, status)?)
    }

    async fn update_order_accrual(&mut self, number: &OrderNumber, accrual: Cents) -> Result<Order, TransactionError> {
        Ok(self.working.update_order_accrual(number, accrual)?)
    }

    async fn fetch_account(&mut self, id: i64) -> Result<UserAccount, TransactionError> {
        self.working.account(id).ok_or(TransactionError::AccountNotFound(id))
    }

    async fn update_balance(&mut self, id: i64, balance: Cents) -> Result<UserAccount, TransactionError> {
        Ok(self.working.update_balance(id, balance)?)
    }

    async fn insert_withdrawal(&mut self, withdrawal: NewWithdrawal) -> Result<Withdrawal, TransactionError> {
        Ok(self.working.insert_withdrawal(withdrawal)?)
    }

    async fn commit(self) -> Result<(), TransactionError> {
        let Self { mut guard, working, faults } = self;
        if faults.take(&faults.commits) {
            return Err(TransactionError::CommitFailed("injected commit failure".into()));
        }
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), TransactionError> {
        if self.faults.take(&self.faults.rollbacks) {
            return Err(TransactionError::DatabaseError("injected rollback failure".into()));
        }
        Ok(())
    }
}
