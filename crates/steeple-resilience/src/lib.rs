// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fault-tolerance primitives for the Steeple messaging gateway.
//!
//! Provides the per-dependency circuit breaker and the bounded
//! exponential-backoff retry executor the outbound send pipeline is
//! built from. Both are explicitly constructed by the composition root
//! and injected; there are no ambient singletons here.

pub mod breaker;
pub mod retry;

pub use breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker, CircuitState};
pub use retry::{with_retry, RetryFailure, RetryPolicy};
