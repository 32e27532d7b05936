//! Client side of the external accrual calculation service.
//!
//! The service is polled with `GET <base>/orders/{number}`. [`AccrualService`] is the seam the reconciliation worker
//! talks to; [`AccrualClient`] is the HTTP implementation.
mod client;
mod objects;

use std::future::Future;

pub use client::{classify_response, AccrualClient};
pub use objects::{AccrualClientError, AccrualInfo, AccrualPoll, AccrualStatus};

use crate::db_types::OrderNumber;

pub trait AccrualService: Sync {
    /// Asks the accrual service for the state of the given order.
    ///
    /// HTTP level outcomes (rate limiting, unexpected status codes) are reported as an [`AccrualPoll`]. Failures to
    /// talk to the service at all, or responses that cannot be understood, are errors.
    fn poll_order(&self, number: &OrderNumber) -> impl Future<Output = Result<AccrualPoll, AccrualClientError>> + Send;
}
