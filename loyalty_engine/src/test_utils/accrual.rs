use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{
    accrual::{AccrualClientError, AccrualInfo, AccrualPoll, AccrualService, AccrualStatus},
    db_types::{Cents, OrderNumber},
};

pub type ScriptedResponse = Result<AccrualPoll, AccrualClientError>;

#[derive(Default)]
struct Script {
    responses: HashMap<String, VecDeque<ScriptedResponse>>,
    calls: Vec<String>,
}

/// An [`AccrualService`] that plays back canned responses.
///
/// Responses are queued per order number and handed out in order. The last response for an order repeats forever, so
/// a single `PROCESSED` entry is enough for the happy path. Orders without a script are reported as `REGISTERED`.
#[derive(Clone, Default)]
pub struct ScriptedAccrualService {
    script: Arc<Mutex<Script>>,
}

impl ScriptedAccrualService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, number: &str, response: ScriptedResponse) -> &Self {
        let mut script = self.script.lock().expect("script lock poisoned");
        script.responses.entry(number.to_string()).or_default().push_back(response);
        self
    }

    pub fn push_many<I: IntoIterator<Item = ScriptedResponse>>(&self, number: &str, responses: I) -> &Self {
        for response in responses {
            self.push(number, response);
        }
        self
    }

    /// Every poll made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().expect("script lock poisoned").calls.clone()
    }

    pub fn calls_for(&self, number: &str) -> usize {
        self.script.lock().expect("script lock poisoned").calls.iter().filter(|n| *n == number).count()
    }
}

impl AccrualService for ScriptedAccrualService {
    async fn poll_order(&self, number: &OrderNumber) -> Result<AccrualPoll, AccrualClientError> {
        let mut script = self.script.lock().expect("script lock poisoned");
        script.calls.push(number.to_string());
        let queue = script.responses.entry(number.to_string()).or_default();
        match queue.len() {
            0 => Ok(ready(number.as_str(), AccrualStatus::Registered, None)),
            1 => queue.front().cloned().expect("checked length"),
            _ => queue.pop_front().expect("checked length"),
        }
    }
}

pub fn ready(number: &str, status: AccrualStatus, accrual: Option<i64>) -> AccrualPoll {
    AccrualPoll::Ready(AccrualInfo { order: number.to_string(), status, accrual: accrual.map(Cents::from) })
}

pub fn processed(number: &str, accrual: i64) -> ScriptedResponse {
    Ok(ready(number, AccrualStatus::Processed, Some(accrual)))
}

pub fn pending(number: &str) -> ScriptedResponse {
    Ok(ready(number, AccrualStatus::Processing, None))
}

pub fn invalid(number: &str) -> ScriptedResponse {
    Ok(ready(number, AccrualStatus::Invalid, None))
}

pub fn rate_limited(secs: Option<u64>) -> ScriptedResponse {
    Ok(AccrualPoll::RateLimited { retry_after: secs.map(Duration::from_secs) })
}

pub fn unavailable(status: u16) -> ScriptedResponse {
    Ok(AccrualPoll::Unavailable { status })
}

pub fn network_error() -> ScriptedResponse {
    Err(AccrualClientError::Network("connection refused".into()))
}

pub fn decode_error() -> ScriptedResponse {
    Err(AccrualClientError::Decode("expected value at line 1 column 1".into()))
}
