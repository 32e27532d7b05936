use loyalty_engine::{
    db_types::{Cents, UserAccount, Withdrawal},
    traits::{AccountApiError, LedgerManagement, WithdrawalManagement},
};
use mockall::mock;

mock! {
    pub LedgerStore {}
    impl LedgerManagement for LedgerStore {
        async fn fetch_account(&self, id: i64) -> Result<Option<UserAccount>, AccountApiError>;
        async fn fetch_account_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError>;
        async fn fetch_or_create_account(&self, login: &str) -> Result<UserAccount, AccountApiError>;
    }
    impl WithdrawalManagement for LedgerStore {
        async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError>;
        async fn fetch_withdrawn_sum_for_user(&self, user_id: i64) -> Result<Cents, AccountApiError>;
    }
}
