use std::collections::VecDeque;

use log::*;
use tokio::time::{sleep, sleep_until, Instant};

use crate::{
    accrual::{AccrualInfo, AccrualPoll, AccrualService, AccrualStatus},
    db_types::{Cents, Order, OrderNumber, OrderStatusType},
    events::{EventProducers, OrderDeadLetteredEvent, OrderInvalidatedEvent, OrderProcessedEvent},
    reconciliation::{policy::MISSING_ORDER_LOOKUPS, ReconciliationReceiver, ReconciliationTask, RetryPolicy},
    traits::{CreditOutcome, LedgerTransaction, OrderManagement, OrderManagementError, TransactionError, TransactionRunner},
};

enum TaskOutcome {
    Resolved,
    Requeue(String),
    DeadLetter(String),
}

/// The single consumer of the reconciliation queue.
///
/// Tasks are handled strictly one at a time. Recovered orders passed to [`with_backlog`](Self::with_backlog) are
/// handled before anything on the queue. Requeued tasks wait in a local deferred list rather than going back onto the
/// bounded queue, so the worker can never block on its own input.
pub struct ReconciliationWorker<B, C> {
    db: B,
    client: C,
    receiver: ReconciliationReceiver,
    policy: RetryPolicy,
    producers: EventProducers,
    backlog: VecDeque<ReconciliationTask>,
    deferred: VecDeque<ReconciliationTask>,
    queue_closed: bool,
}

impl<B, C> ReconciliationWorker<B, C>
where
    B: OrderManagement + TransactionRunner,
    C: AccrualService,
{
    pub fn new(db: B, client: C, receiver: ReconciliationReceiver, policy: RetryPolicy, producers: EventProducers) -> Self {
        Self {
            db,
            client,
            receiver,
            policy,
            producers,
            backlog: VecDeque::new(),
            deferred: VecDeque::new(),
            queue_closed: false,
        }
    }

    /// Seeds the worker with orders that were left unresolved by a previous run. They are processed in the given order,
    /// ahead of anything submitted through the queue.
    pub fn with_backlog(mut self, orders: Vec<Order>) -> Self {
        self.backlog.extend(orders.iter().map(ReconciliationTask::from));
        self
    }

    /// Processes tasks until every queue handle has been dropped and no deferred work remains.
    pub async fn run(mut self) {
        info!("🔄️ Reconciliation worker started with {} recovered orders", self.backlog.len());
        while let Some(task) = self.next_task().await {
            self.handle_task(task).await;
        }
        info!("🔄️ Reconciliation worker has stopped");
    }

    async fn next_task(&mut self) -> Option<ReconciliationTask> {
        if let Some(task) = self.backlog.pop_front() {
            return Some(task);
        }
        loop {
            let Some(due) = self.deferred.front().map(|t| t.not_before.unwrap_or_else(Instant::now)) else {
                if self.queue_closed {
                    return None;
                }
                return self.receiver.recv().await;
            };
            if self.queue_closed {
                sleep_until(due).await;
                return self.deferred.pop_front();
            }
            tokio::select! {
                biased;
                task = self.receiver.recv() => match task {
                    Some(task) => return Some(task),
                    None => self.queue_closed = true,
                },
                _ = sleep_until(due) => return self.deferred.pop_front(),
            }
        }
    }

    async fn handle_task(&mut self, task: ReconciliationTask) {
        debug!("🔄️ Reconciling order {} for user #{}", task.order_number, task.user_id);
        match self.reconcile(&task.order_number).await {
            TaskOutcome::Resolved => {},
            TaskOutcome::Requeue(reason) => self.requeue(task, reason).await,
            TaskOutcome::DeadLetter(reason) => self.dead_letter(task, reason).await,
        }
    }

    async fn requeue(&mut self, mut task: ReconciliationTask, reason: String) {
        task.requeues += 1;
        if let Some(max) = self.policy.max_requeues {
            if task.requeues > max {
                let reason = format!("{reason}. Gave up after {max} requeues");
                return self.dead_letter(task, reason).await;
            }
        }
        warn!(
            "🔄️ Order {} goes to the back of the line (requeue #{}). {reason}. Retrying in {:?}",
            task.order_number, task.requeues, self.policy.requeue_delay
        );
        task.not_before = Some(Instant::now() + self.policy.requeue_delay);
        self.deferred.push_back(task);
    }

    async fn dead_letter(&self, task: ReconciliationTask, reason: String) {
        error!(
            "🔄️💀️ Giving up on order {} for user #{}. {reason}. It will be picked up again on the next restart.",
            task.order_number, task.user_id
        );
        let event = OrderDeadLetteredEvent::new(task.order_number, task.user_id, reason);
        self.producers.publish_order_dead_lettered(event).await;
    }

    async fn reconcile(&self, number: &OrderNumber) -> TaskOutcome {
        match self.find_order(number).await {
            None => {
                let reason = format!("Order {number} does not exist after {MISSING_ORDER_LOOKUPS} lookups");
                return TaskOutcome::DeadLetter(reason);
            },
            Some(order) if order.status.is_terminal() => {
                debug!("🔄️ Order {number} is already {}. Skipping", order.status);
                return TaskOutcome::Resolved;
            },
            Some(_) => {},
        }
        if let Err(outcome) = self.mark_processing(number).await {
            return outcome;
        }
        let info = match self.poll_until_settled(number).await {
            Ok(info) => info,
            Err(outcome) => return outcome,
        };
        if info.order != number.as_str() {
            warn!("🔄️ Asked about order {number}, but the accrual service answered for '{}'", info.order);
        }
        match info.status {
            AccrualStatus::Invalid => self.invalidate(number).await,
            AccrualStatus::Processed => self.credit(number, info.accrual.unwrap_or_default()).await,
            AccrualStatus::Registered | AccrualStatus::Processing => {
                TaskOutcome::Requeue(format!("Order {number} is still pending"))
            },
        }
    }

    /// The queue entry for a fresh submission can arrive before its row is visible to this connection, so a missing
    /// order is looked up a few times before the worker gives up on it.
    async fn find_order(&self, number: &OrderNumber) -> Option<Order> {
        for lookup in 1..=MISSING_ORDER_LOOKUPS {
            if let Some(order) = self.load_order(number).await {
                return Some(order);
            }
            if lookup < MISSING_ORDER_LOOKUPS {
                debug!(
                    "🔄️ Order {number} not found (lookup {lookup} of {MISSING_ORDER_LOOKUPS}). Looking again in {:?}",
                    self.policy.persistence_retry_delay
                );
                sleep(self.policy.persistence_retry_delay).await;
            }
        }
        None
    }

    async fn load_order(&self, number: &OrderNumber) -> Option<Order> {
        loop {
            match self.db.fetch_order_by_number(number).await {
                Ok(order) => return order,
                Err(e) => {
                    warn!("🔄️ Could not load order {number}. {e}. Retrying in {:?}", self.policy.persistence_retry_delay);
                    sleep(self.policy.persistence_retry_delay).await;
                },
            }
        }
    }

    async fn mark_processing(&self, number: &OrderNumber) -> Result<(), TaskOutcome> {
        loop {
            match self.db.update_order_status(number, OrderStatusType::Processing).await {
                Ok(_) => {
                    trace!("🔄️ Order {number} is now PROCESSING");
                    return Ok(());
                },
                Err(OrderManagementError::ForbiddenStatusChange { from, .. }) => {
                    debug!("🔄️ Order {number} was resolved elsewhere. It is {from}");
                    return Err(TaskOutcome::Resolved);
                },
                Err(OrderManagementError::OrderNotFound(_)) => {
                    return Err(TaskOutcome::DeadLetter(format!("Order {number} does not exist")));
                },
                Err(e) => {
                    warn!(
                        "🔄️ Could not mark order {number} as PROCESSING. {e}. Retrying in {:?}",
                        self.policy.persistence_retry_delay
                    );
                    sleep(self.policy.persistence_retry_delay).await;
                },
            }
        }
    }

    /// Polls the accrual service until it reports a terminal state for the order.
    async fn poll_until_settled(&self, number: &OrderNumber) -> Result<AccrualInfo, TaskOutcome> {
        let max_polls = self.policy.max_polls_per_visit.max(1);
        let mut polls = 0u32;
        let mut network_failures = 0u32;
        loop {
            match self.client.poll_order(number).await {
                Ok(AccrualPoll::Ready(info)) if !info.status.is_pending() => return Ok(info),
                Ok(AccrualPoll::Ready(info)) => {
                    network_failures = 0;
                    polls += 1;
                    trace!("🔄️ Order {number} is {:?} upstream", info.status);
                    if polls >= max_polls {
                        return Err(TaskOutcome::Requeue(format!("Order {number} is still pending after {polls} polls")));
                    }
                },
                Ok(AccrualPoll::RateLimited { retry_after }) => {
                    network_failures = 0;
                    let wait = retry_after.unwrap_or(self.policy.poll_interval);
                    info!("🔄️ The accrual service is rate limiting us. Waiting {wait:?} before asking about {number}");
                    sleep(wait).await;
                    continue;
                },
                Ok(AccrualPoll::Unavailable { status }) => {
                    network_failures = 0;
                    polls += 1;
                    warn!("🔄️ The accrual service answered with status {status} for order {number}");
                    if polls >= max_polls {
                        return Err(TaskOutcome::Requeue(format!(
                            "The accrual service kept answering with status {status}"
                        )));
                    }
                },
                Err(e) if e.is_transient() => {
                    network_failures += 1;
                    warn!("🔄️ Poll #{network_failures} for order {number} failed. {e}");
                    if network_failures >= self.policy.max_network_failures.max(1) {
                        return Err(TaskOutcome::Requeue(format!("{network_failures} network failures in a row. {e}")));
                    }
                },
                Err(e) => return Err(TaskOutcome::DeadLetter(e.to_string())),
            }
            sleep(self.policy.poll_interval).await;
        }
    }

    async fn invalidate(&self, number: &OrderNumber) -> TaskOutcome {
        loop {
            match self.db.update_order_status(number, OrderStatusType::Invalid).await {
                Ok(order) => {
                    info!("🔄️ Order {number} for user #{} is INVALID. Nothing was credited", order.user_id);
                    self.producers.publish_order_invalidated(OrderInvalidatedEvent::new(order)).await;
                    return TaskOutcome::Resolved;
                },
                Err(OrderManagementError::ForbiddenStatusChange { from, .. }) => {
                    debug!("🔄️ Order {number} was resolved elsewhere. It is {from}");
                    return TaskOutcome::Resolved;
                },
                Err(OrderManagementError::OrderNotFound(_)) => {
                    return TaskOutcome::DeadLetter(format!("Order {number} does not exist"));
                },
                Err(e) => {
                    warn!(
                        "🔄️ Could not mark order {number} as INVALID. {e}. Retrying in {:?}",
                        self.policy.persistence_retry_delay
                    );
                    sleep(self.policy.persistence_retry_delay).await;
                },
            }
        }
    }

    /// Credits the accrual in a single transaction, retrying until it commits. The accrual reported by the service is
    /// kept across retries; the service is not asked again.
    async fn credit(&self, number: &OrderNumber, accrual: Cents) -> TaskOutcome {
        loop {
            let order_number = number.clone();
            let result = self
                .db
                .run_in_transaction(move |tx| Box::pin(async move { credit_order(tx, &order_number, accrual).await }))
                .await;
            match result {
                Ok(CreditOutcome::Credited { order, account }) => {
                    info!(
                        "🔄️💰️ Order {number} is PROCESSED. Credited {} to user #{}. The balance is now {}",
                        order.accrual, account.id, account.balance
                    );
                    self.producers.publish_order_processed(OrderProcessedEvent::new(order, account)).await;
                    return TaskOutcome::Resolved;
                },
                Ok(CreditOutcome::AlreadyResolved(order)) => {
                    debug!("🔄️ Order {number} was resolved elsewhere. It is {}", order.status);
                    return TaskOutcome::Resolved;
                },
                Err(e @ TransactionError::OrderNotFound(_))
                | Err(e @ TransactionError::AccountNotFound(_))
                | Err(e @ TransactionError::BalanceOverflow(_)) => {
                    return TaskOutcome::DeadLetter(format!("Could not credit order {number}. {e}"));
                },
                Err(e) => {
                    warn!(
                        "🔄️ Could not credit order {number}. {e}. Retrying in {:?}",
                        self.policy.persistence_retry_delay
                    );
                    sleep(self.policy.persistence_retry_delay).await;
                },
            }
        }
    }
}

/// Records the accrual, marks the order as processed and adds the accrual to the owner's balance.
///
/// Orders that are already terminal are left untouched and reported as [`CreditOutcome::AlreadyResolved`], so a
/// credit can never be applied twice.
pub(crate) async fn credit_order<T: LedgerTransaction>(
    tx: &mut T,
    number: &OrderNumber,
    accrual: Cents,
) -> Result<CreditOutcome, TransactionError> {
    let order = tx.fetch_order(number).await?.ok_or_else(|| TransactionError::OrderNotFound(number.clone()))?;
    if order.status.is_terminal() {
        return Ok(CreditOutcome::AlreadyResolved(order));
    }
    // The accrual can only be written while the order is still open
    tx.update_order_accrual(number, accrual).await?;
    if order.status == OrderStatusType::New {
        tx.update_order_status(number, OrderStatusType::Processing).await?;
    }
    let order = tx.update_order_status(number, OrderStatusType::Processed).await?;
    let account = tx.fetch_account(order.user_id).await?;
    let balance = account.balance.checked_add(accrual).ok_or(TransactionError::BalanceOverflow(account.id))?;
    let account = tx.update_balance(account.id, balance).await?;
    Ok(CreditOutcome::Credited { order, account })
}
