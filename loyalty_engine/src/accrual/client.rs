use std::{sync::Arc, time::Duration};

use log::*;
use lpg_common::parse_balance;
use reqwest::{
    header::{HeaderValue, RETRY_AFTER},
    Client,
    StatusCode,
};
use serde::Deserialize;

use super::{AccrualClientError, AccrualInfo, AccrualPoll, AccrualService, AccrualStatus};
use crate::db_types::OrderNumber;

#[derive(Clone)]
pub struct AccrualClient {
    base_url: String,
    client: Arc<Client>,
}

impl AccrualClient {
    /// Creates a client for the accrual service at `base_url`. Every request is abandoned after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AccrualClientError> {
        let client =
            Client::builder().timeout(timeout).build().map_err(|e| AccrualClientError::Initialization(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { base_url, client: Arc::new(client) })
    }

    pub fn order_url(&self, number: &OrderNumber) -> String {
        format!("{}/orders/{number}", self.base_url)
    }
}

impl AccrualService for AccrualClient {
    async fn poll_order(&self, number: &OrderNumber) -> Result<AccrualPoll, AccrualClientError> {
        let url = self.order_url(number);
        trace!("🌐️ GET {url}");
        let response = self.client.get(&url).send().await.map_err(|e| AccrualClientError::Network(e.to_string()))?;
        let status = response.status();
        let retry_after = response.headers().get(RETRY_AFTER).cloned();
        let body = response.bytes().await.map_err(|e| AccrualClientError::Network(e.to_string()))?;
        trace!("🌐️ {url} answered with {status}");
        classify_response(status, retry_after.as_ref(), &body)
    }
}

#[derive(Deserialize)]
struct AccrualResponse {
    order: String,
    status: AccrualStatus,
    #[serde(default)]
    accrual: Option<serde_json::Number>,
}

/// Maps a raw accrual service response onto an [`AccrualPoll`].
///
/// * 200 is decoded as an order report. A body that is not valid JSON, carries an unknown status or an amount that
///   cannot be represented in minor units is a [`AccrualClientError::Decode`] error.
/// * 429 yields [`AccrualPoll::RateLimited`] with the `Retry-After` delay if it is given in seconds.
/// * Everything else is [`AccrualPoll::Unavailable`].
pub fn classify_response(
    status: StatusCode,
    retry_after: Option<&HeaderValue>,
    body: &[u8],
) -> Result<AccrualPoll, AccrualClientError> {
    match status {
        StatusCode::OK => {
            let response: AccrualResponse =
                serde_json::from_slice(body).map_err(|e| AccrualClientError::Decode(e.to_string()))?;
            let accrual = response
                .accrual
                .map(|n| parse_balance(&n.to_string()))
                .transpose()
                .map_err(|e| AccrualClientError::Decode(format!("Invalid accrual for order {}. {e}", response.order)))?;
            Ok(AccrualPoll::Ready(AccrualInfo { order: response.order, status: response.status, accrual }))
        },
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = parse_retry_after(retry_after);
            if retry_after.is_none() {
                warn!("🌐️ The accrual service is rate limiting us but did not say for how long");
            }
            Ok(AccrualPoll::RateLimited { retry_after })
        },
        other => Ok(AccrualPoll::Unavailable { status: other.as_u16() }),
    }
}

fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    value.and_then(|v| v.to_str().ok()).and_then(|s| s.trim().parse::<u64>().ok()).map(Duration::from_secs)
}
