//! `SqliteDatabase` is the production backend of the loyalty engine.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::{
    db::{accounts, new_pool, orders, withdrawals},
    SqliteLedgerTransaction,
};
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

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Connection pool for {url} created");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        // `RETURNING` hands back the row before the statement completes, so the insert only becomes visible to other
        // connections once it is committed explicitly.
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(number, status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_order_accrual(&self, number: &OrderNumber, accrual: Cents) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_accrual(number, accrual, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_unresolved_orders(&self) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_unresolved_orders(&mut conn).await?;
        Ok(orders)
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_account(&self, id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_account(id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_account_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_account_by_login(login, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_or_create_account(&self, login: &str) -> Result<UserAccount, AccountApiError> {
        // Committed explicitly for the same reason as `insert_order`
        let mut tx = self.pool.begin().await?;
        let account = accounts::fetch_or_create_account(login, &mut tx).await?;
        tx.commit().await?;
        Ok(account)
    }
}

impl WithdrawalManagement for SqliteDatabase {
    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }

    async fn fetch_withdrawn_sum_for_user(&self, user_id: i64) -> Result<Cents, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let sum = withdrawals::fetch_withdrawn_sum_for_user(user_id, &mut conn).await?;
        Ok(sum)
    }
}

impl TransactionRunner for SqliteDatabase {
    type Transaction = SqliteLedgerTransaction;

    async fn begin(&self) -> Result<SqliteLedgerTransaction, TransactionError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteLedgerTransaction::new(tx))
    }
}
