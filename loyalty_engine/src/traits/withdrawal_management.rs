use std::future::Future;

use crate::{
    db_types::{Cents, Withdrawal},
    traits::AccountApiError,
};

/// Read access to the withdrawal history. Withdrawals are created by
/// [`LedgerTransaction::insert_withdrawal`](crate::traits::LedgerTransaction::insert_withdrawal).
pub trait WithdrawalManagement {
    /// All withdrawals for the user, oldest first.
    fn fetch_withdrawals_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Withdrawal>, AccountApiError>> + Send;

    /// The total amount the user has ever withdrawn. Zero if there are no withdrawals.
    fn fetch_withdrawn_sum_for_user(&self, user_id: i64) -> impl Future<Output = Result<Cents, AccountApiError>> + Send;
}
