use sqlx::{Sqlite, Transaction};

use super::db::{accounts, orders, withdrawals};
use crate::{
    db_types::{Cents, NewWithdrawal, Order, OrderNumber, OrderStatusType, UserAccount, Withdrawal},
    traits::{LedgerTransaction, TransactionError},
};

/// A [`LedgerTransaction`] backed by a `sqlx` transaction on the SQLite pool.
pub struct SqliteLedgerTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteLedgerTransaction {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }
}

impl LedgerTransaction for SqliteLedgerTransaction {
    async fn fetch_order(&mut self, number: &OrderNumber) -> Result<Option<Order>, TransactionError> {
        let order = orders::fetch_order_by_number(number, &mut self.tx).await?;
        Ok(order)
    }

    async fn update_order_status(
        &mut self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> Result<Order, TransactionError> {
        let order = orders::update_order_status(number, status, &mut self.tx).await?;
        Ok(order)
    }

    async fn update_order_accrual(&mut self, number: &OrderNumber, accrual: Cents) -> Result<Order, TransactionError> {
        let order = orders::update_order_accrual(number, accrual, &mut self.tx).await?;
        Ok(order)
    }

    async fn fetch_account(&mut self, id: i64) -> Result<UserAccount, TransactionError> {
        accounts::fetch_account(id, &mut self.tx).await?.ok_or(TransactionError::AccountNotFound(id))
    }

    async fn update_balance(&mut self, id: i64, balance: Cents) -> Result<UserAccount, TransactionError> {
        let account = accounts::update_balance(id, balance, &mut self.tx).await?;
        Ok(account)
    }

    async fn insert_withdrawal(&mut self, withdrawal: NewWithdrawal) -> Result<Withdrawal, TransactionError> {
        let withdrawal = withdrawals::insert_withdrawal(withdrawal, &mut self.tx).await?;
        Ok(withdrawal)
    }

    async fn commit(self) -> Result<(), TransactionError> {
        self.tx.commit().await.map_err(|e| TransactionError::CommitFailed(e.to_string()))
    }

    async fn rollback(self) -> Result<(), TransactionError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
