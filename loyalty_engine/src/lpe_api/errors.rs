use thiserror::Error;

use crate::{
    db_types::{Cents, InvalidOrderNumber},
    reconciliation::QueueClosed,
    traits::{AccountApiError, OrderManagementError, TransactionError},
};

#[derive(Debug, Clone, Error)]
pub enum EnrollmentError {
    #[error(transparent)]
    InvalidOrderNumber(#[from] InvalidOrderNumber),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error(transparent)]
    QueueClosed(#[from] QueueClosed),
}

impl From<OrderManagementError> for EnrollmentError {
    fn from(e: OrderManagementError) -> Self {
        EnrollmentError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum WithdrawError {
    #[error(transparent)]
    InvalidOrderNumber(#[from] InvalidOrderNumber),
    #[error("Cannot withdraw nothing")]
    EmptyBalance,
    #[error("Cannot withdraw a negative amount ({0})")]
    InvalidAmount(Cents),
    #[error("Insufficient funds. The balance is {balance}, but {requested} was requested")]
    NoMoney { balance: Cents, requested: Cents },
    #[error("Account #{0} does not exist")]
    AccountNotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AccountApiError> for WithdrawError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::AccountNotFound(id) => WithdrawError::AccountNotFound(id),
            e => WithdrawError::DatabaseError(e.to_string()),
        }
    }
}

impl From<TransactionError> for WithdrawError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::InsufficientFunds { balance, requested } => WithdrawError::NoMoney { balance, requested },
            TransactionError::AccountNotFound(id) => WithdrawError::AccountNotFound(id),
            e => WithdrawError::DatabaseError(e.to_string()),
        }
    }
}
