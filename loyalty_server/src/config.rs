use std::{env, str::FromStr, time::Duration};

use log::*;
use loyalty_engine::{reconciliation::DEFAULT_QUEUE_CAPACITY, RetryPolicy};
use lpg_common::parse_boolean_flag;

const DEFAULT_LPG_HOST: &str = "127.0.0.1";
const DEFAULT_LPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty_store.db";
const DEFAULT_ACCRUAL_SYSTEM_URL: &str = "http://127.0.0.1:8080/api";
const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_AUTH_HEADER: &str = "X-Authenticated-User";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Base URL of the accrual calculation service. Orders are polled at `<accrual_system_url>/orders/{number}`.
    pub accrual_system_url: String,
    pub accrual_timeout: Duration,
    /// The request header carrying the login of the caller. The server sits behind a gateway that authenticates users
    /// and sets this header; requests without it are rejected.
    pub auth_header: String,
    pub queue_capacity: usize,
    pub poll_interval: Duration,
    pub persistence_retry_delay: Duration,
    pub max_network_failures: u32,
    pub max_polls_per_visit: u32,
    /// `None` means orders are requeued indefinitely.
    pub max_requeues: Option<u32>,
    pub requeue_delay: Duration,
    /// If false, the schema is assumed to be up to date and migrations are skipped on startup.
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            host: DEFAULT_LPG_HOST.to_string(),
            port: DEFAULT_LPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            accrual_system_url: DEFAULT_ACCRUAL_SYSTEM_URL.to_string(),
            accrual_timeout: DEFAULT_ACCRUAL_TIMEOUT,
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: policy.poll_interval,
            persistence_retry_delay: policy.persistence_retry_delay,
            max_network_failures: policy.max_network_failures,
            max_polls_per_visit: policy.max_polls_per_visit,
            max_requeues: policy.max_requeues,
            requeue_delay: policy.requeue_delay,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let host = env::var("LPG_HOST").ok().unwrap_or(defaults.host);
        let port = parse_env("LPG_PORT", defaults.port);
        let database_url = env::var("LPG_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ LPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            defaults.database_url
        });
        let accrual_system_url = env::var("LPG_ACCRUAL_SYSTEM_URL").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ LPG_ACCRUAL_SYSTEM_URL is not set. Please set it to the base URL of the accrual service. Using \
                 {DEFAULT_ACCRUAL_SYSTEM_URL} for now."
            );
            defaults.accrual_system_url
        });
        let accrual_timeout = parse_secs("LPG_ACCRUAL_TIMEOUT", defaults.accrual_timeout);
        let auth_header = env::var("LPG_AUTH_HEADER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.auth_header);
        let queue_capacity = match parse_env("LPG_QUEUE_CAPACITY", defaults.queue_capacity) {
            0 => {
                warn!("🪛️ LPG_QUEUE_CAPACITY must be at least 1. Using {DEFAULT_QUEUE_CAPACITY}.");
                DEFAULT_QUEUE_CAPACITY
            },
            n => n,
        };
        let poll_interval = parse_secs("LPG_POLL_INTERVAL", defaults.poll_interval);
        let persistence_retry_delay = parse_secs("LPG_PERSISTENCE_RETRY_DELAY", defaults.persistence_retry_delay);
        let max_network_failures = parse_env("LPG_MAX_NETWORK_FAILURES", defaults.max_network_failures);
        let max_polls_per_visit = parse_env("LPG_MAX_POLLS_PER_VISIT", defaults.max_polls_per_visit);
        let max_requeues = env::var("LPG_MAX_REQUEUES").ok().and_then(|s| match s.trim() {
            "" | "none" | "unlimited" => None,
            s => s.parse::<u32>().map_err(|e| warn!("🪛️ Invalid value for LPG_MAX_REQUEUES ({s}). {e}")).ok(),
        });
        let requeue_delay = parse_secs("LPG_REQUEUE_DELAY", defaults.requeue_delay);
        let run_migrations = parse_boolean_flag(env::var("LPG_RUN_MIGRATIONS").ok(), defaults.run_migrations);
        Self {
            host,
            port,
            database_url,
            accrual_system_url,
            accrual_timeout,
            auth_header,
            queue_capacity,
            poll_interval,
            persistence_retry_delay,
            max_network_failures,
            max_polls_per_visit,
            max_requeues,
            requeue_delay,
            run_migrations,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            poll_interval: self.poll_interval,
            persistence_retry_delay: self.persistence_retry_delay,
            max_network_failures: self.max_network_failures,
            max_polls_per_visit: self.max_polls_per_visit,
            requeue_delay: self.requeue_delay,
            max_requeues: self.max_requeues,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

fn parse_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(parse_env(name, default.as_secs()))
}
