use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::Cents;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualClientError {
    #[error("Could not initialize the accrual client: {0}")]
    Initialization(String),
    #[error("Could not reach the accrual service: {0}")]
    Network(String),
    #[error("Could not understand the accrual service response: {0}")]
    Decode(String),
}

impl AccrualClientError {
    /// Network errors are worth retrying. A response we cannot decode will not get better by asking again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// The order states reported by the accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl AccrualStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Registered | Self::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualInfo {
    pub order: String,
    pub status: AccrualStatus,
    /// Only present once the order has been processed. A processed order without an accrual earned nothing.
    pub accrual: Option<Cents>,
}

/// The outcome of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualPoll {
    /// The service answered with the current state of the order.
    Ready(AccrualInfo),
    /// HTTP 429. The service asked us to wait for `retry_after` before trying again.
    RateLimited { retry_after: Option<Duration> },
    /// Any other non-200 status. Treated as a transient failure.
    Unavailable { status: u16 },
}
