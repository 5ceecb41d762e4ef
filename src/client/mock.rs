//! Mock parlay API for unit testing.
//!
//! Serves queued verdicts without making network requests and records every
//! request it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::ParlayApi;
use crate::error::ApiError;
use crate::parlay::{BuildResponse, PickId};

/// One queued outcome: a verdict or a transport failure message.
type MockOutcome = Result<BuildResponse, String>;

/// Mock parlay API.
#[derive(Debug, Clone, Default)]
pub struct MockParlayApi {
    /// Outcomes served in order; an empty queue answers "valid".
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    /// Pick ids of every request received.
    requests: Arc<Mutex<Vec<Vec<PickId>>>>,
    /// Simulated latency in milliseconds.
    latency_ms: u64,
}

impl MockParlayApi {
    /// Create a mock that accepts every parlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add simulated latency to every call.
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Queue a server verdict.
    pub fn push_response(&self, response: BuildResponse) {
        self.outcomes.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a transport failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.outcomes.lock().unwrap().push_back(Err(message.into()));
    }

    /// Pick ids of every request received, in order.
    pub fn requests(&self) -> Vec<Vec<PickId>> {
        self.requests.lock().unwrap().clone()
    }
}

impl ParlayApi for MockParlayApi {
    async fn build_parlay(&self, pick_ids: &[PickId]) -> Result<BuildResponse, ApiError> {
        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }

        self.requests.lock().unwrap().push(pick_ids.to_vec());
        let outcome = self.outcomes.lock().unwrap().pop_front();

        match outcome {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(ApiError::RequestFailed {
                endpoint: "/parlays/build".to_string(),
                reason,
            }),
            None => Ok(BuildResponse::valid(None, None)),
        }
    }
}
