//! Order submission.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
    lpe_api::errors::EnrollmentError,
    reconciliation::{ReconciliationQueue, ReconciliationTask},
    traits::{OrderManagement, OrderManagementError},
};

/// `EnrollmentApi` accepts order numbers from users and hands new orders to the reconciliation worker.
pub struct EnrollmentApi<B> {
    db: B,
    queue: ReconciliationQueue,
}

impl<B: Debug> Debug for EnrollmentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EnrollmentApi ({:?})", self.db)
    }
}

impl<B> EnrollmentApi<B>
where B: OrderManagement
{
    pub fn new(db: B, queue: ReconciliationQueue) -> Self {
        Self { db, queue }
    }

    /// Registers `order_number` for `user_id`.
    ///
    /// * Unknown orders are stored as `NEW`, owned by `user_id`, and queued for reconciliation.
    /// * An order the caller already owns that is still `NEW` is queued again. Orders past `NEW` are left alone.
    /// * An order owned by somebody else is returned untouched. Compare [`Order::user_id`] with the caller to detect
    ///   this case.
    ///
    /// The current state of the order is returned in every case. If the reconciliation queue is full, this call waits
    /// until there is room.
    pub async fn require_order(&self, order_number: &str, user_id: i64) -> Result<Order, EnrollmentError> {
        let number = OrderNumber::validated(order_number)?;
        let order = match self.db.fetch_order_by_number(&number).await? {
            Some(order) => order,
            None => self.insert_or_fetch(number, user_id).await?,
        };
        if !order.is_owned_by(user_id) {
            info!(
                "📝️ User #{user_id} submitted order {}, which already belongs to user #{}",
                order.order_number, order.user_id
            );
            return Ok(order);
        }
        if order.status == OrderStatusType::New {
            self.queue.enqueue(ReconciliationTask::from(&order)).await?;
            debug!("📝️ Order {} for user #{user_id} queued for reconciliation", order.order_number);
        }
        Ok(order)
    }

    // Two users can race to submit the same number. The loser picks up the winner's row.
    async fn insert_or_fetch(&self, number: OrderNumber, user_id: i64) -> Result<Order, EnrollmentError> {
        match self.db.insert_order(NewOrder::new(number.clone(), user_id)).await {
            Ok(order) => {
                info!("📝️ Order {number} registered for user #{user_id}");
                Ok(order)
            },
            Err(OrderManagementError::OrderAlreadyExists(_)) => {
                debug!("📝️ Order {number} was registered concurrently. Fetching the stored order");
                self.db.fetch_order_by_number(&number).await?.ok_or_else(|| {
                    EnrollmentError::DatabaseError(format!("Order {number} was reported as a duplicate but cannot be found"))
                })
            },
            Err(e) => Err(e.into()),
        }
    }

    /// All the orders the user has submitted, oldest first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, EnrollmentError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        trace!("📝️ {} orders found for user #{user_id}", orders.len());
        Ok(orders)
    }

    /// Orders that have not reached a terminal state, oldest first. Used to recover work on startup.
    pub async fn unresolved_orders(&self) -> Result<Vec<Order>, EnrollmentError> {
        let orders = self.db.fetch_unresolved_orders().await?;
        Ok(orders)
    }
}
