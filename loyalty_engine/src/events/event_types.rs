use serde::{Deserialize, Serialize};

use crate::db_types::{Cents, Order, OrderNumber, UserAccount};

/// An order was confirmed by the accrual service and its accrual was credited to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProcessedEvent {
    pub order: Order,
    pub account: UserAccount,
}

impl OrderProcessedEvent {
    pub fn new(order: Order, account: UserAccount) -> Self {
        Self { order, account }
    }

    pub fn accrual(&self) -> Cents {
        self.order.accrual
    }
}

/// The accrual service rejected an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInvalidatedEvent {
    pub order: Order,
}

impl OrderInvalidatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// The worker gave up on an order. The order keeps its current status in the store and is picked up again by the
/// startup recovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDeadLetteredEvent {
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub reason: String,
}

impl OrderDeadLetteredEvent {
    pub fn new(order_number: OrderNumber, user_id: i64, reason: impl Into<String>) -> Self {
        Self { order_number, user_id, reason: reason.into() }
    }
}
