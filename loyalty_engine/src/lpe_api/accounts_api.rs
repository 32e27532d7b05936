//! Unifies API for accessing accounts.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::UserAccount,
    traits::{AccountApiError, BalanceSummary, LedgerManagement, WithdrawalManagement},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: LedgerManagement + WithdrawalManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Returns the account for the given login, creating an empty one if this is the first time the login is seen.
    pub async fn fetch_or_create_account(&self, login: &str) -> Result<UserAccount, AccountApiError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(AccountApiError::InvalidLogin(login.to_string()));
        }
        let account = self.db.fetch_or_create_account(login).await?;
        trace!("🗃️ Login '{login}' is account #{}", account.id);
        Ok(account)
    }

    /// Fetches the user account for the given account id. If no account exists, `None` is returned.
    pub async fn account_by_id(&self, account_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_account(account_id).await
    }

    pub async fn balance_for_user(&self, user_id: i64) -> Result<BalanceSummary, AccountApiError> {
        let account = self.account_by_id(user_id).await?.ok_or(AccountApiError::AccountNotFound(user_id))?;
        let withdrawn = self.db.fetch_withdrawn_sum_for_user(user_id).await?;
        Ok(BalanceSummary { current: account.balance, withdrawn })
    }
}
