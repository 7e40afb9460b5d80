// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded exponential-backoff retry with jitter.
//!
//! Sleeps block only the calling task; concurrent sends are never
//! serialized against each other.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use steeple_core::{FailureClass, SteepleError};

/// Retry configuration for one class of dependency.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `max_retries: 2` means at most
    /// three attempts in total.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Uniform jitter fraction applied to each delay, in `[0, 1)`.
    /// Avoids synchronized retry storms across concurrent callers.
    pub jitter_factor: f64,
}

impl RetryPolicy {
    /// Profile for the messaging provider: tolerant. User-facing latency
    /// matters less than delivery, so retry often with short delays.
    pub fn messaging() -> Self {
        Self {
            max_retries: 4,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }

    /// Profile for the payment provider: conservative. Correctness over
    /// speed; long delays and few retries to avoid duplicate charges.
    pub fn payments() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 3.0,
            jitter_factor: 0.1,
        }
    }

    /// Backoff delay before retry `attempt` (0-indexed), jittered.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);
        let jittered = if self.jitter_factor > 0.0 {
            let spread = rand::thread_rng()
                .gen_range(-self.jitter_factor..=self.jitter_factor);
            capped * (1.0 + spread)
        } else {
            capped
        };
        Duration::from_millis(jittered.max(0.0) as u64)
    }
}

/// A retry run that ended in failure.
///
/// Carries how many retries were actually consumed so dead-letter
/// bookkeeping can record it.
#[derive(Debug)]
pub struct RetryFailure {
    pub error: SteepleError,
    pub retries_used: u32,
}

impl From<RetryFailure> for SteepleError {
    fn from(failure: RetryFailure) -> Self {
        failure.error
    }
}

/// Run `f`, retrying transient failures per `policy`.
///
/// Permanent errors abort immediately without consuming retries, and
/// circuit-open rejections abort immediately because the breaker already
/// encodes "don't bother". After `max_retries` transient failures the
/// final error propagates.
pub async fn with_retry<T, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    mut f: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SteepleError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match f().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(operation, retries = attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => match error.classify() {
                FailureClass::Permanent => {
                    debug!(operation, error = %error, "permanent failure, not retrying");
                    return Err(RetryFailure {
                        error,
                        retries_used: attempt,
                    });
                }
                FailureClass::CircuitOpen => {
                    debug!(operation, "circuit open, not retrying");
                    return Err(RetryFailure {
                        error,
                        retries_used: attempt,
                    });
                }
                FailureClass::Transient => {
                    if attempt >= policy.max_retries {
                        warn!(
                            operation,
                            retries = attempt,
                            error = %error,
                            "retries exhausted"
                        );
                        return Err(RetryFailure {
                            error,
                            retries_used: attempt,
                        });
                    }
                    let delay = policy.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}
