use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Cents, UserAccount},
    traits::AccountApiError,
};

pub async fn fetch_account(id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM user_accounts WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(account)
}

pub async fn fetch_account_by_login(
    login: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let account =
        sqlx::query_as("SELECT * FROM user_accounts WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(account)
}

/// Fetches the account for `login`, creating a zero-balance account if this is the first time the login is seen.
/// This function is idempotent due to the uniqueness constraint on the login column.
pub async fn fetch_or_create_account(login: &str, conn: &mut SqliteConnection) -> Result<UserAccount, AccountApiError> {
    let inserted = sqlx::query("INSERT INTO user_accounts (login) VALUES ($1) ON CONFLICT (login) DO NOTHING")
        .bind(login)
        .execute(&mut *conn)
        .await?;
    if inserted.rows_affected() > 0 {
        debug!("🗃️ Created a new account for '{login}'");
    }
    let account = fetch_account_by_login(login, conn)
        .await?
        .ok_or_else(|| AccountApiError::DatabaseError(format!("Account for '{login}' vanished after it was created")))?;
    Ok(account)
}

/// Overwrites the balance of the account. The schema refuses negative balances.
pub async fn update_balance(id: i64, balance: Cents, conn: &mut SqliteConnection) -> Result<UserAccount, AccountApiError> {
    let account: Option<UserAccount> = sqlx::query_as(
        r#"
            UPDATE user_accounts SET balance = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(balance.value())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    account.ok_or(AccountApiError::AccountNotFound(id))
}
