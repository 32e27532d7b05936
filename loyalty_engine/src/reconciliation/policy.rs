use std::time::Duration;

pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_PERSISTENCE_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_NETWORK_FAILURES: u32 = 5;
pub const DEFAULT_MAX_POLLS_PER_VISIT: u32 = 60;
pub const DEFAULT_REQUEUE_DELAY: Duration = Duration::from_secs(30);
/// Lookups of a missing order, spaced by the persistence retry delay, before it is dead-lettered.
pub const MISSING_ORDER_LOOKUPS: u32 = 3;

/// Timing and retry limits for the reconciliation worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between polls while the order is pending upstream or the service answers with an unexpected status. Also
    /// used for rate limiting responses that do not carry a usable `Retry-After` header.
    pub poll_interval: Duration,
    /// Wait before retrying a failed status update or credit transaction.
    pub persistence_retry_delay: Duration,
    /// Consecutive network failures after which the order is put back at the end of the line.
    pub max_network_failures: u32,
    /// Pending or unexpected-status polls after which the order is put back at the end of the line, so that one slow
    /// order cannot hold up the queue forever. Rate limited polls do not count.
    pub max_polls_per_visit: u32,
    /// How long a requeued order waits before it is polled again.
    pub requeue_delay: Duration,
    /// Requeues after which an order is dead-lettered. `None` means orders are requeued indefinitely.
    pub max_requeues: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            persistence_retry_delay: DEFAULT_PERSISTENCE_RETRY_DELAY,
            max_network_failures: DEFAULT_MAX_NETWORK_FAILURES,
            max_polls_per_visit: DEFAULT_MAX_POLLS_PER_VISIT,
            requeue_delay: DEFAULT_REQUEUE_DELAY,
            max_requeues: None,
        }
    }
}
