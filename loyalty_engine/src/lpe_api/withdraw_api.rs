use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Cents, NewWithdrawal, OrderNumber, Withdrawal},
    lpe_api::errors::WithdrawError,
    traits::{LedgerManagement, LedgerTransaction, TransactionError, TransactionRunner, WithdrawalManagement},
};

/// `WithdrawApi` spends loyalty points against an order.
pub struct WithdrawApi<B> {
    db: B,
}

impl<B: Debug> Debug for WithdrawApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawApi ({:?})", self.db)
    }
}

impl<B> WithdrawApi<B>
where B: LedgerManagement + WithdrawalManagement + TransactionRunner
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Debits `sum` from the user's balance and records the withdrawal against `order_number`.
    ///
    /// The debit and the withdrawal record are written in the same transaction. The balance is checked again inside
    /// the transaction, so concurrent withdrawals can never overdraw the account.
    pub async fn create_withdrawal(
        &self,
        user_id: i64,
        order_number: &str,
        sum: Cents,
    ) -> Result<Withdrawal, WithdrawError> {
        let number = OrderNumber::validated(order_number)?;
        if sum.is_zero() {
            return Err(WithdrawError::EmptyBalance);
        }
        if sum.is_negative() {
            return Err(WithdrawError::InvalidAmount(sum));
        }
        let account = self.db.fetch_account(user_id).await?.ok_or(WithdrawError::AccountNotFound(user_id))?;
        if sum > account.balance {
            debug!("💸️ User #{user_id} asked for {sum}, but only has {}", account.balance);
            return Err(WithdrawError::NoMoney { balance: account.balance, requested: sum });
        }
        let withdrawal = NewWithdrawal::new(number, user_id, sum);
        let withdrawal = self
            .db
            .run_in_transaction(move |tx| Box::pin(async move { debit_account(tx, withdrawal).await }))
            .await?;
        info!("💸️ User #{user_id} withdrew {sum} against order {}", withdrawal.order_number);
        Ok(withdrawal)
    }

    /// The user's withdrawals, oldest first.
    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, WithdrawError> {
        let withdrawals = self.db.fetch_withdrawals_for_user(user_id).await?;
        Ok(withdrawals)
    }

    /// Everything the user has ever withdrawn. Zero if they have never withdrawn anything.
    pub async fn withdrawn_sum_for_user(&self, user_id: i64) -> Result<Cents, WithdrawError> {
        let sum = self.db.fetch_withdrawn_sum_for_user(user_id).await?;
        Ok(sum)
    }
}

async fn debit_account<T: LedgerTransaction>(
    tx: &mut T,
    withdrawal: NewWithdrawal,
) -> Result<Withdrawal, TransactionError> {
    let account = tx.fetch_account(withdrawal.user_id).await?;
    let balance = account
        .balance
        .checked_sub(withdrawal.sum)
        .filter(|b| !b.is_negative())
        .ok_or(TransactionError::InsufficientFunds { balance: account.balance, requested: withdrawal.sum })?;
    tx.update_balance(account.id, balance).await?;
    tx.insert_withdrawal(withdrawal).await
}
