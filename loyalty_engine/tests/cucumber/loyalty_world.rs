use std::{collections::HashMap, fmt::Debug, time::Duration};

use cucumber::World;
use log::*;
use loyalty_engine::{
    db_types::{Order, Withdrawal},
    events::EventProducers,
    reconciliation_queue,
    test_utils::{
        prepare_env::{create_database, random_db_path, run_migrations},
        ScriptedAccrualService,
    },
    AccountApi,
    EnrollmentApi,
    EnrollmentError,
    ReconciliationWorker,
    RetryPolicy,
    SqliteDatabase,
    WithdrawApi,
    WithdrawError,
};
use tokio::task::JoinHandle;

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
    pub users: HashMap<String, i64>,
    pub last_upload: Option<Result<Order, EnrollmentError>>,
    pub last_withdrawal: Option<Result<Withdrawal, WithdrawError>>,
}

pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub client: ScriptedAccrualService,
    pub enrollment: Option<EnrollmentApi<SqliteDatabase>>,
    pub accounts: AccountApi<SqliteDatabase>,
    pub withdrawals: WithdrawApi<SqliteDatabase>,
    pub worker: Option<JoinHandle<()>>,
}

impl Debug for LoyaltySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoyaltySystem ({})", self.db_path)
    }
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LoyaltySystem {
        self.system.as_ref().expect("LoyaltySystem not initialised")
    }

    pub fn user(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("User {login} has not been registered"))
    }
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let client = ScriptedAccrualService::new();
        let policy = RetryPolicy {
            poll_interval: Duration::from_millis(5),
            persistence_retry_delay: Duration::from_millis(5),
            requeue_delay: Duration::from_millis(5),
            ..RetryPolicy::default()
        };
        let (queue, receiver) = reconciliation_queue(10);
        let enrollment = EnrollmentApi::new(db.clone(), queue);
        let worker = ReconciliationWorker::new(db.clone(), client.clone(), receiver, policy, EventProducers::default());
        let worker = tokio::spawn(worker.run());
        Self {
            db_path: url,
            accounts: AccountApi::new(db.clone()),
            withdrawals: WithdrawApi::new(db.clone()),
            enrollment: Some(enrollment),
            db,
            client,
            worker: Some(worker),
        }
    }

    pub fn enrollment(&self) -> &EnrollmentApi<SqliteDatabase> {
        self.enrollment.as_ref().expect("Reconciliation has already been shut down")
    }

    /// Closes the queue and waits for the worker to settle everything it was given.
    pub async fn finish_reconciliation(&mut self) {
        self.enrollment = None;
        if let Some(worker) = self.worker.take() {
            worker.await.expect("Worker panicked");
        }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
