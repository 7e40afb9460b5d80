// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Steeple messaging gateway.

use thiserror::Error;

/// The primary error type used across all Steeple crates.
#[derive(Debug, Error)]
pub enum SteepleError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook authentication failures (bad, missing, or stale signature).
    #[error("authentication failure: {0}")]
    Authentication(String),

    /// Malformed request payloads. No side effects have occurred.
    #[error("validation failure: {0}")]
    Validation(String),

    /// A lookup missed. Benign in steady-state traffic (unknown tenant,
    /// non-member sender, receipt for an unknown message).
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Provider dependency errors. `status` carries the HTTP status code
    /// when one was received; `None` means the request never completed
    /// (connect failure, timeout at the transport layer).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The circuit breaker for `dependency` is open; the call was rejected
    /// without being attempted.
    #[error("circuit open for {dependency}")]
    CircuitOpen { dependency: String },

    /// An outbound send exhausted its fault-tolerance budget and was
    /// captured to the dead letter store.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// How a failed operation should be treated by the retry executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Worth retrying: the dependency may recover (network, 5xx, 429).
    Transient,
    /// Retrying cannot help (other 4xx, validation, auth, logic errors).
    Permanent,
    /// The circuit breaker already knows the dependency is down. Not
    /// retried: the breaker encodes "don't bother".
    CircuitOpen,
}

impl SteepleError {
    /// Classify this error for retry purposes.
    ///
    /// HTTP 429 and all 5xx responses are transient; any other status that
    /// reached us is a permanent protocol-level rejection. A provider error
    /// with no status means the request died on the wire, which is transient.
    pub fn classify(&self) -> FailureClass {
        match self {
            SteepleError::Provider { status, .. } => match status {
                None => FailureClass::Transient,
                Some(429) => FailureClass::Transient,
                Some(s) if *s >= 500 => FailureClass::Transient,
                Some(_) => FailureClass::Permanent,
            },
            SteepleError::Timeout { .. } => FailureClass::Transient,
            SteepleError::CircuitOpen { .. } => FailureClass::CircuitOpen,
            _ => FailureClass::Permanent,
        }
    }

    /// True if this error represents a benign steady-state miss rather
    /// than a fault (used by webhook handlers to acknowledge and move on).
    pub fn is_benign_miss(&self) -> bool {
        matches!(self, SteepleError::NotFound { .. })
    }
}
