use log::*;
use loyalty_engine::{
    accrual::AccrualService,
    db_types::Order,
    events::{EventHandlers, EventHooks},
    reconciliation::{ReconciliationReceiver, ReconciliationWorker, RetryPolicy},
    traits::{OrderManagement, TransactionRunner},
};
use tokio::task::JoinHandle;

use crate::errors::ServerError;

const EVENT_BUFFER_SIZE: usize = 64;

/// The running reconciliation worker and the tasks that deliver its events to the hooks.
pub struct AccrualWorker {
    worker: JoinHandle<()>,
    hooks: Vec<JoinHandle<()>>,
}

impl AccrualWorker {
    /// Waits for the worker to stop, then for the hooks to handle every event it published.
    pub async fn join(self) {
        let Self { worker, hooks } = self;
        match worker.await {
            Ok(()) => debug!("🚀️ Reconciliation worker finished"),
            Err(e) if e.is_cancelled() => debug!("🚀️ Reconciliation worker was cancelled"),
            Err(e) => error!("🚀️ Reconciliation worker failed. {e}"),
        }
        for hook in hooks {
            if let Err(e) = hook.await {
                error!("🚀️ An event hook failed. {e}");
            }
        }
    }

    /// Stops the worker without waiting for the queue to drain. Events it already published are still handled.
    pub async fn shutdown(self) {
        self.worker.abort();
        self.join().await
    }
}

/// Starts the reconciliation worker.
///
/// Orders left unresolved by a previous run are read from the store before the worker is spawned, and are handled
/// before anything that arrives on `receiver`. Call this before the HTTP server starts accepting requests.
///
/// The worker stops once every queue handle has been dropped. Use [`AccrualWorker::shutdown`] to stop it sooner.
pub async fn start_accrual_worker<B, C>(
    db: B,
    client: C,
    receiver: ReconciliationReceiver,
    policy: RetryPolicy,
) -> Result<AccrualWorker, ServerError>
where
    B: OrderManagement + TransactionRunner + Send + 'static,
    C: AccrualService + Send + 'static,
{
    let backlog = db
        .fetch_unresolved_orders()
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not load unresolved orders. {e}")))?;
    if backlog.is_empty() {
        info!("🚀️ No unresolved orders to recover");
    } else {
        info!("🚀️ Recovering {} unresolved orders", backlog.len());
        debug!("🚀️ Recovered orders: {}", order_list(&backlog));
    }
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    let worker = ReconciliationWorker::new(db, client, receiver, policy, producers).with_backlog(backlog);
    let hooks = handlers.start_handlers();
    Ok(AccrualWorker { worker: tokio::spawn(worker.run()), hooks })
}

/// Hooks that write every reconciliation outcome to the log. Dead-lettered orders are logged as errors, since they need
/// an operator's attention.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_processed(|ev| {
            Box::pin(async move {
                info!(
                    "📬️ Order {} credited {} to {}. The balance is now {}",
                    ev.order.order_number,
                    ev.accrual(),
                    ev.account.login,
                    ev.account.balance
                );
            })
        })
        .on_order_invalidated(|ev| {
            Box::pin(async move {
                info!(
                    "📬️ Order {} for user #{} was rejected by the accrual service",
                    ev.order.order_number, ev.order.user_id
                );
            })
        })
        .on_order_dead_lettered(|ev| {
            Box::pin(async move {
                error!(
                    "📬️ DEAD LETTER: order {} for user #{} could not be reconciled. {}",
                    ev.order_number, ev.user_id, ev.reason
                );
            })
        });
    hooks
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("{} ({}, user #{})", o.order_number, o.status, o.user_id))
        .collect::<Vec<String>>()
        .join(", ")
}
