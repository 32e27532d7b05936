use sqlx::SqliteConnection;

use crate::db_types::{Cents, NewWithdrawal, Withdrawal};

pub async fn insert_withdrawal(withdrawal: NewWithdrawal, conn: &mut SqliteConnection) -> Result<Withdrawal, sqlx::Error> {
    let withdrawal = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (order_number, user_id, sum) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(withdrawal.order_number.as_str())
    .bind(withdrawal.user_id)
    .bind(withdrawal.sum.value())
    .fetch_one(conn)
    .await?;
    Ok(withdrawal)
}

/// Returns all withdrawals for the user, oldest first.
pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}

pub async fn fetch_withdrawn_sum_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Cents, sqlx::Error> {
    let sum: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(sum), 0) FROM withdrawals WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(Cents::from(sum))
}
