use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Cents, NewOrder, Order, OrderNumber, OrderStatusType},
    traits::OrderManagementError,
};

/// Inserts a new order in the `NEW` state. A duplicate order number is reported as
/// [`OrderManagementError::OrderAlreadyExists`], whoever the existing owner is.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderManagementError> {
    let number = order.order_number.clone();
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (order_number, user_id) VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(order.order_number.as_str())
    .bind(order.user_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => OrderManagementError::OrderAlreadyExists(number),
        _ => OrderManagementError::from(e),
    })?;
    debug!("🗃️ Order [{}] inserted with id {} for user #{}", order.order_number, order.id, order.user_id);
    Ok(order)
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Moves the order to `status` if the state machine allows it.
///
/// The update is a compare-and-set against the status that was read, so a concurrent writer cannot be overwritten.
pub async fn update_order_status(
    number: &OrderNumber,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderManagementError> {
    let current = fetch_order_by_number(number, conn)
        .await?
        .ok_or_else(|| OrderManagementError::OrderNotFound(number.clone()))?;
    if !current.status.can_transition_to(status) {
        return Err(OrderManagementError::ForbiddenStatusChange {
            number: number.clone(),
            from: current.status,
            to: status,
        });
    }
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(number.as_str())
    .bind(current.status.to_string())
    .fetch_optional(conn)
    .await?;
    let order = order.ok_or_else(|| {
        OrderManagementError::DatabaseError(format!("Order {number} was modified while its status was being updated"))
    })?;
    trace!("🗃️ Order [{number}] moved from {} to {}", current.status, order.status);
    Ok(order)
}

/// Writes the accrual for an order. Orders that have reached a terminal state are never modified.
pub async fn update_order_accrual(
    number: &OrderNumber,
    accrual: Cents,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderManagementError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET accrual = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $2 AND status IN ('NEW', 'PROCESSING')
            RETURNING *;
        "#,
    )
    .bind(accrual.value())
    .bind(number.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    match order {
        Some(order) => Ok(order),
        None => match fetch_order_by_number(number, conn).await? {
            Some(existing) => Err(OrderManagementError::ForbiddenStatusChange {
                number: number.clone(),
                from: existing.status,
                to: existing.status,
            }),
            None => Err(OrderManagementError::OrderNotFound(number.clone())),
        },
    }
}

/// Returns all orders for the user, ordered by upload time, oldest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Returns every order that has not reached a terminal state, oldest first.
pub async fn fetch_unresolved_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status IN ('NEW', 'PROCESSING')
            ORDER BY uploaded_at ASC, id ASC
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
