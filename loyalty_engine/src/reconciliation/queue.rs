use thiserror::Error;
use tokio::{sync::mpsc, time::Instant};

use crate::db_types::{Order, OrderNumber};

/// A request to reconcile one order. This is a snapshot of the order number and owner at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationTask {
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub(crate) requeues: u32,
    pub(crate) not_before: Option<Instant>,
}

impl ReconciliationTask {
    pub fn new(order_number: OrderNumber, user_id: i64) -> Self {
        Self { order_number, user_id, requeues: 0, not_before: None }
    }

    /// How many times the worker has put this task back in line.
    pub fn requeues(&self) -> u32 {
        self.requeues
    }
}

impl From<&Order> for ReconciliationTask {
    fn from(order: &Order) -> Self {
        Self::new(order.order_number.clone(), order.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The reconciliation worker is not running. Order {0} could not be queued")]
pub struct QueueClosed(pub OrderNumber);

/// The producer side of the reconciliation queue. Clone it freely; the worker stops once every clone is dropped.
#[derive(Debug, Clone)]
pub struct ReconciliationQueue {
    sender: mpsc::Sender<ReconciliationTask>,
}

impl ReconciliationQueue {
    /// Adds a task to the back of the queue, waiting for space if the queue is full. Tasks are never dropped.
    pub async fn enqueue(&self, task: ReconciliationTask) -> Result<(), QueueClosed> {
        self.sender.send(task).await.map_err(|e| QueueClosed(e.0.order_number))
    }

    /// The number of tasks that can be queued right now without waiting.
    pub fn available_capacity(&self) -> usize {
        self.sender.capacity()
    }
}

/// The consumer side of the reconciliation queue. Owned by the [`ReconciliationWorker`](super::ReconciliationWorker).
#[derive(Debug)]
pub struct ReconciliationReceiver {
    receiver: mpsc::Receiver<ReconciliationTask>,
}

impl ReconciliationReceiver {
    pub(crate) async fn recv(&mut self) -> Option<ReconciliationTask> {
        self.receiver.recv().await
    }

    /// Takes the next task if one is waiting. Never blocks.
    pub fn try_recv(&mut self) -> Option<ReconciliationTask> {
        self.receiver.try_recv().ok()
    }
}

/// Creates a bounded FIFO reconciliation queue. A capacity of zero is treated as one.
pub fn reconciliation_queue(capacity: usize) -> (ReconciliationQueue, ReconciliationReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (ReconciliationQueue { sender }, ReconciliationReceiver { receiver })
}
