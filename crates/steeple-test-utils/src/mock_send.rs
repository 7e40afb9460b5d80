// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Programmable mock of the provider send API.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use steeple_core::types::{SendReceipt, SendRequest};
use steeple_core::{SendApi, SteepleError};

/// One scripted outcome: a provider message id, or an HTTP status to
/// fail with (`None` simulates a network-level failure).
pub enum SendOutcome {
    Accepted(String),
    Status(u16),
    Network,
}

/// Mock [`SendApi`] with scripted outcomes and recorded requests.
///
/// Outcomes are consumed front-to-back; when the script runs out, sends
/// succeed with generated ids.
pub struct MockSendApi {
    outcomes: Mutex<VecDeque<SendOutcome>>,
    requests: Mutex<Vec<SendRequest>>,
    calls: AtomicU32,
}

impl MockSendApi {
    pub fn new() -> Self {
        Self::with_outcomes(Vec::new())
    }

    pub fn with_outcomes(outcomes: Vec<SendOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Append outcomes to the script.
    pub async fn push_outcomes(&self, outcomes: Vec<SendOutcome>) {
        self.outcomes.lock().await.extend(outcomes);
    }

    /// Total calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request seen, in order.
    pub async fn requests(&self) -> Vec<SendRequest> {
        self.requests.lock().await.clone()
    }

    /// Poll until at least `n` calls were made, or panic after a second.
    pub async fn wait_for_calls(&self, n: u32) {
        for _ in 0..200 {
            if self.calls() >= n {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("expected {n} send calls, saw {}", self.calls());
    }
}

impl Default for MockSendApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SendApi for MockSendApi {
    async fn send_message(&self, request: &SendRequest) -> Result<SendReceipt, SteepleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());
        match self.outcomes.lock().await.pop_front() {
            Some(SendOutcome::Accepted(id)) => Ok(SendReceipt {
                provider_message_id: id,
            }),
            Some(SendOutcome::Status(status)) => Err(SteepleError::Provider {
                message: format!("{status} from provider"),
                status: Some(status),
                source: None,
            }),
            Some(SendOutcome::Network) => Err(SteepleError::Provider {
                message: "connection reset by peer".into(),
                status: None,
                source: None,
            }),
            None => Ok(SendReceipt {
                provider_message_id: uuid::Uuid::new_v4().to_string(),
            }),
        }
    }
}
