use std::future::Future;

use thiserror::Error;

use crate::db_types::{Cents, NewOrder, Order, OrderNumber, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderNumber),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Order {number} cannot move from {from} to {to}")]
    ForbiddenStatusChange { number: OrderNumber, from: OrderStatusType, to: OrderStatusType },
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// The order repository.
///
/// Order numbers are globally unique. The first successful [`insert_order`](OrderManagement::insert_order) for a
/// number determines its owner forever.
pub trait OrderManagement {
    /// Fetches the order with the given number, or `None` if it has never been submitted.
    fn fetch_order_by_number(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<Option<Order>, OrderManagementError>> + Send;

    /// Creates a new order in the `NEW` state.
    ///
    /// Fails with [`OrderManagementError::OrderAlreadyExists`] if an order with the same number is already stored,
    /// regardless of who owns it.
    fn insert_order(&self, order: NewOrder) -> impl Future<Output = Result<Order, OrderManagementError>> + Send;

    /// Moves the order to `status`. Terminal orders are never modified, and the update fails with
    /// [`OrderManagementError::ForbiddenStatusChange`] if the transition is not allowed.
    fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> impl Future<Output = Result<Order, OrderManagementError>> + Send;

    /// Sets the accrual for an order that has not reached a terminal state.
    fn update_order_accrual(
        &self,
        number: &OrderNumber,
        accrual: Cents,
    ) -> impl Future<Output = Result<Order, OrderManagementError>> + Send;

    /// All the orders uploaded by the given user, oldest first.
    fn fetch_orders_for_user(&self, user_id: i64)
        -> impl Future<Output = Result<Vec<Order>, OrderManagementError>> + Send;

    /// Every order in the `NEW` or `PROCESSING` state, oldest first.
    fn fetch_unresolved_orders(&self) -> impl Future<Output = Result<Vec<Order>, OrderManagementError>> + Send;
}
