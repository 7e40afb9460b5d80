// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circuit breaker for external dependencies.
//!
//! One explicitly-constructed instance per dependency, owned by the
//! composition root and passed by reference to callers. State lives in
//! memory only and rebuilds to CLOSED on process restart.

use std::future::Future;
use std::sync::Mutex;
use std::time::SystemTime;

use tokio::time::Instant;
use tracing::{debug, warn};

use steeple_core::SteepleError;

/// Consecutive successful probes required to close a half-open breaker.
const CLOSE_AFTER_PROBE_SUCCESSES: u32 = 2;

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures in CLOSED before the breaker opens.
    pub failure_threshold: u32,
    /// Cool-down before an OPEN breaker allows a half-open probe.
    pub reset_timeout: std::time::Duration,
    /// Maximum concurrent probes allowed while HALF_OPEN.
    pub half_open_probes: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: std::time::Duration::from_secs(30),
            half_open_probes: 2,
        }
    }
}

/// Breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// All calls pass through.
    Closed,
    /// All calls are rejected immediately.
    Open,
    /// A limited probe quota passes through to test recovery.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half-open"),
        }
    }
}

/// Read-only view of breaker health for dashboards.
#[derive(Debug, Clone)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub total_calls: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub total_rejected: u64,
    pub consecutive_failures: u32,
    pub last_failure_at: Option<SystemTime>,
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    probe_successes: u32,
    probes_in_flight: u32,
    next_attempt: Option<Instant>,
    total_calls: u64,
    total_successes: u64,
    total_failures: u64,
    total_rejected: u64,
    last_failure_at: Option<SystemTime>,
}

/// Tracks rolling health of one external dependency and gates calls
/// through it. Shared across all concurrent callers in the process;
/// every state transition happens under a single mutex.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                probe_successes: 0,
                probes_in_flight: 0,
                next_attempt: None,
                total_calls: 0,
                total_successes: 0,
                total_failures: 0,
                total_rejected: 0,
                last_failure_at: None,
            }),
        }
    }

    /// The dependency this breaker guards.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. An OPEN breaker whose cool-down has lapsed still
    /// reads OPEN until the next call transitions it to HALF_OPEN.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Read-only metrics snapshot.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            total_calls: inner.total_calls,
            total_successes: inner.total_successes,
            total_failures: inner.total_failures,
            total_rejected: inner.total_rejected,
            consecutive_failures: inner.consecutive_failures,
            last_failure_at: inner.last_failure_at,
        }
    }

    /// Run `f` through the breaker.
    ///
    /// While OPEN (before the cool-down lapses) or while the HALF_OPEN
    /// probe quota is exhausted, fails fast with
    /// [`SteepleError::CircuitOpen`] without invoking `f`. That error
    /// classifies as non-retryable so the retry executor does not treat
    /// it as transient network noise.
    pub async fn execute<T, F, Fut>(&self, f: F) -> Result<T, SteepleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SteepleError>>,
    {
        let probe = self.try_acquire()?;
        let result = f().await;
        match &result {
            Ok(_) => self.on_success(probe),
            Err(_) => self.on_failure(probe),
        }
        result
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Decide whether a call may proceed. Returns whether it counts as a
    /// half-open probe. The OPEN -> HALF_OPEN transition happens lazily
    /// here, on the first call at or after `next_attempt`.
    fn try_acquire(&self) -> Result<bool, SteepleError> {
        let mut inner = self.lock();
        inner.total_calls += 1;

        if inner.state == CircuitState::Open {
            let eligible = inner
                .next_attempt
                .is_some_and(|at| Instant::now() >= at);
            if eligible {
                debug!(breaker = %self.name, "cool-down lapsed, entering half-open");
                inner.state = CircuitState::HalfOpen;
                inner.probe_successes = 0;
                inner.probes_in_flight = 0;
            } else {
                inner.total_rejected += 1;
                return Err(self.open_error());
            }
        }

        match inner.state {
            CircuitState::Closed => Ok(false),
            CircuitState::HalfOpen => {
                if inner.probes_in_flight < self.config.half_open_probes {
                    inner.probes_in_flight += 1;
                    Ok(true)
                } else {
                    inner.total_rejected += 1;
                    Err(self.open_error())
                }
            }
            // Open was handled above.
            CircuitState::Open => {
                inner.total_rejected += 1;
                Err(self.open_error())
            }
        }
    }

    fn on_success(&self, probe: bool) {
        let mut inner = self.lock();
        inner.total_successes += 1;
        if probe {
            inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
            if inner.state == CircuitState::HalfOpen {
                inner.probe_successes += 1;
                if inner.probe_successes >= CLOSE_AFTER_PROBE_SUCCESSES {
                    debug!(breaker = %self.name, "probes recovered, closing circuit");
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.next_attempt = None;
                }
            }
        } else {
            inner.consecutive_failures = 0;
        }
    }

    fn on_failure(&self, probe: bool) {
        let mut inner = self.lock();
        inner.total_failures += 1;
        inner.last_failure_at = Some(SystemTime::now());
        if probe {
            inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
            warn!(breaker = %self.name, "half-open probe failed, re-opening circuit");
            self.trip(&mut inner);
        } else if inner.state == CircuitState::Closed {
            inner.consecutive_failures += 1;
            if inner.consecutive_failures >= self.config.failure_threshold {
                warn!(
                    breaker = %self.name,
                    failures = inner.consecutive_failures,
                    "failure threshold reached, opening circuit"
                );
                self.trip(&mut inner);
            }
        }
    }

    fn trip(&self, inner: &mut Inner) {
        inner.state = CircuitState::Open;
        inner.probe_successes = 0;
        inner.next_attempt = Some(Instant::now() + self.config.reset_timeout);
    }

    fn open_error(&self) -> SteepleError {
        SteepleError::CircuitOpen {
            dependency: self.name.clone(),
        }
    }
}
