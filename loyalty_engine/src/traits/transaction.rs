use std::{future::Future, pin::Pin};

use log::*;
use thiserror::Error;

use crate::{
    db_types::{Cents, NewWithdrawal, Order, OrderNumber, OrderStatusType, UserAccount, Withdrawal},
    traits::{AccountApiError, OrderManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum TransactionError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Account #{0} does not exist")]
    AccountNotFound(i64),
    #[error("Order {number} cannot move from {from} to {to}")]
    ForbiddenStatusChange { number: OrderNumber, from: OrderStatusType, to: OrderStatusType },
    #[error("Insufficient funds. The balance is {balance}, but {requested} was requested")]
    InsufficientFunds { balance: Cents, requested: Cents },
    #[error("The balance for account #{0} would overflow")]
    BalanceOverflow(i64),
    #[error("Could not commit the transaction. {0}")]
    CommitFailed(String),
    #[error("{cause} The rollback also failed. {reason}")]
    RollbackFailed { cause: Box<TransactionError>, reason: String },
}

impl From<sqlx::Error> for TransactionError {
    fn from(e: sqlx::Error) -> Self {
        TransactionError::DatabaseError(e.to_string())
    }
}

impl From<OrderManagementError> for TransactionError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::DatabaseError(s) => TransactionError::DatabaseError(s),
            OrderManagementError::OrderAlreadyExists(n) => {
                TransactionError::DatabaseError(format!("Order {n} already exists"))
            },
            OrderManagementError::OrderNotFound(n) => TransactionError::OrderNotFound(n),
            OrderManagementError::ForbiddenStatusChange { number, from, to } => {
                TransactionError::ForbiddenStatusChange { number, from, to }
            },
        }
    }
}

impl From<AccountApiError> for TransactionError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(s) => TransactionError::DatabaseError(s),
            AccountApiError::AccountNotFound(id) => TransactionError::AccountNotFound(id),
            AccountApiError::InvalidLogin(_) => TransactionError::DatabaseError(e.to_string()),
        }
    }
}

/// The future returned by the unit of work passed to [`TransactionRunner::run_in_transaction`].
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransactionError>> + Send + 'a>>;

/// An open, atomic unit of work against the order and ledger repositories.
///
/// Nothing written through a `LedgerTransaction` is visible to other readers until [`commit`](Self::commit)
/// succeeds. Dropping the transaction without committing discards every change.
pub trait LedgerTransaction: Send {
    fn fetch_order(
        &mut self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<Option<Order>, TransactionError>> + Send;

    /// Moves the order to `status`, enforcing the same transition rules as
    /// [`OrderManagement::update_order_status`](crate::traits::OrderManagement::update_order_status).
    fn update_order_status(
        &mut self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> impl Future<Output = Result<Order, TransactionError>> + Send;

    fn update_order_accrual(
        &mut self,
        number: &OrderNumber,
        accrual: Cents,
    ) -> impl Future<Output = Result<Order, TransactionError>> + Send;

    /// Reads the account as seen by this transaction. Fails with [`TransactionError::AccountNotFound`] if it is
    /// missing.
    fn fetch_account(&mut self, id: i64) -> impl Future<Output = Result<UserAccount, TransactionError>> + Send;

    /// Overwrites the account balance.
    fn update_balance(
        &mut self,
        id: i64,
        balance: Cents,
    ) -> impl Future<Output = Result<UserAccount, TransactionError>> + Send;

    fn insert_withdrawal(
        &mut self,
        withdrawal: NewWithdrawal,
    ) -> impl Future<Output = Result<Withdrawal, TransactionError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), TransactionError>> + Send;

    fn rollback(self) -> impl Future<Output = Result<(), TransactionError>> + Send;
}

/// Hands out [`LedgerTransaction`]s.
pub trait TransactionRunner: Sync {
    type Transaction: LedgerTransaction;

    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, TransactionError>> + Send;

    /// Runs `f` inside a fresh transaction.
    ///
    /// The transaction is committed if `f` succeeds. Otherwise it is rolled back and `f`'s error is returned. A failed
    /// commit is reported as [`TransactionError::CommitFailed`] and a failed rollback as
    /// [`TransactionError::RollbackFailed`], carrying the original error along.
    fn run_in_transaction<T, F>(&self, f: F) -> impl Future<Output = Result<T, TransactionError>> + Send
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut Self::Transaction) -> TxFuture<'a, T> + Send,
    {
        async move {
            let mut tx = self.begin().await?;
            let result = f(&mut tx).await;
            match result {
                Ok(value) => {
                    tx.commit().await?;
                    trace!("🗃️ Transaction committed");
                    Ok(value)
                },
                Err(e) => {
                    debug!("🗃️ Rolling back transaction. {e}");
                    match tx.rollback().await {
                        Ok(()) => Err(e),
                        Err(rollback_err) => {
                            error!("🗃️ Could not roll back transaction after '{e}'. {rollback_err}");
                            Err(TransactionError::RollbackFailed { cause: Box::new(e), reason: rollback_err.to_string() })
                        },
                    }
                },
            }
        }
    }
}
