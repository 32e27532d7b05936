use std::future::Future;

use thiserror::Error;

use crate::db_types::UserAccount;

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Account #{0} does not exist")]
    AccountNotFound(i64),
    #[error("'{0}' is not a valid login")]
    InvalidLogin(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Read access to the ledger.
///
/// Balances are only ever written through a [`LedgerTransaction`](crate::traits::LedgerTransaction).
pub trait LedgerManagement {
    /// Fetches the account with the given id. If no account exists, `None` is returned.
    fn fetch_account(&self, id: i64) -> impl Future<Output = Result<Option<UserAccount>, AccountApiError>> + Send;

    fn fetch_account_by_login(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<Option<UserAccount>, AccountApiError>> + Send;

    /// Returns the account for `login`, creating an empty one the first time a login is seen.
    fn fetch_or_create_account(&self, login: &str)
        -> impl Future<Output = Result<UserAccount, AccountApiError>> + Send;
}
