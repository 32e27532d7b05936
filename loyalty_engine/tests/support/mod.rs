#![allow(dead_code)]
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use loyalty_engine::{
    db_types::Order,
    events::{EventHandlers, EventHooks, OrderDeadLetteredEvent, OrderInvalidatedEvent, OrderProcessedEvent},
    reconciliation_queue,
    test_utils::ScriptedAccrualService,
    AccountApi,
    EnrollmentApi,
    MemoryDatabase,
    ReconciliationWorker,
    RetryPolicy,
};
use tokio::task::JoinHandle;

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        poll_interval: Duration::from_millis(1),
        persistence_retry_delay: Duration::from_millis(1),
        max_network_failures: 3,
        max_polls_per_visit: 5,
        requeue_delay: Duration::from_millis(1),
        max_requeues: None,
    }
}

/// Collects every event the worker publishes.
#[derive(Clone, Default)]
pub struct Recorder {
    pub processed: Arc<Mutex<Vec<OrderProcessedEvent>>>,
    pub invalidated: Arc<Mutex<Vec<OrderInvalidatedEvent>>>,
    pub dead_lettered: Arc<Mutex<Vec<OrderDeadLetteredEvent>>>,
}

impl Recorder {
    pub fn hooks(&self) -> EventHooks {
        let mut hooks = EventHooks::default();
        let processed = self.processed.clone();
        let invalidated = self.invalidated.clone();
        let dead_lettered = self.dead_lettered.clone();
        hooks
            .on_order_processed(move |ev| {
                let store = processed.clone();
                Box::pin(async move { store.lock().unwrap().push(ev) })
            })
            .on_order_invalidated(move |ev| {
                let store = invalidated.clone();
                Box::pin(async move { store.lock().unwrap().push(ev) })
            })
            .on_order_dead_lettered(move |ev| {
                let store = dead_lettered.clone();
                Box::pin(async move { store.lock().unwrap().push(ev) })
            });
        hooks
    }

    pub fn processed(&self) -> Vec<OrderProcessedEvent> {
        self.processed.lock().unwrap().clone()
    }

    pub fn invalidated(&self) -> Vec<OrderInvalidatedEvent> {
        self.invalidated.lock().unwrap().clone()
    }

    pub fn dead_lettered(&self) -> Vec<OrderDeadLetteredEvent> {
        self.dead_lettered.lock().unwrap().clone()
    }
}

/// A running reconciliation pipeline over the memory backend.
pub struct Pipeline {
    pub db: MemoryDatabase,
    pub client: ScriptedAccrualService,
    pub accounts: AccountApi<MemoryDatabase>,
    pub enrollment: EnrollmentApi<MemoryDatabase>,
    pub recorder: Recorder,
    worker: JoinHandle<()>,
    handlers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub fn start(db: MemoryDatabase, client: ScriptedAccrualService, policy: RetryPolicy, backlog: Vec<Order>) -> Self {
        let _ = env_logger::try_init();
        let recorder = Recorder::default();
        let handlers = EventHandlers::new(16, recorder.hooks());
        let producers = handlers.producers();
        let (queue, receiver) = reconciliation_queue(10);
        let enrollment = EnrollmentApi::new(db.clone(), queue);
        let worker =
            ReconciliationWorker::new(db.clone(), client.clone(), receiver, policy, producers).with_backlog(backlog);
        let worker = tokio::spawn(worker.run());
        let handlers = handlers.start_handlers();
        let accounts = AccountApi::new(db.clone());
        Self { db, client, accounts, enrollment, recorder, worker, handlers }
    }

    /// Closes the queue and waits until the worker and all event hooks have finished.
    pub async fn finish(self) -> (MemoryDatabase, ScriptedAccrualService, Recorder) {
        let Self { db, client, enrollment, recorder, worker, handlers, .. } = self;
        drop(enrollment);
        worker.await.expect("worker panicked");
        for handler in handlers {
            handler.await.expect("event handler panicked");
        }
        (db, client, recorder)
    }
}
