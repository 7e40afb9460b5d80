// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge};

/// Register all Steeple metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "steeple_webhooks_total",
        "Inbound webhook events by kind and outcome"
    );
    describe_counter!("steeple_sends_total", "Outbound send attempts by outcome");
    describe_counter!(
        "steeple_dead_letters_total",
        "Dead letter entries written, by category"
    );
    describe_counter!(
        "steeple_receipts_total",
        "Delivery receipts processed, by outcome"
    );
    describe_gauge!(
        "steeple_breaker_state",
        "Circuit breaker state (0 closed, 1 half-open, 2 open)"
    );
    describe_counter!(
        "steeple_breaker_rejections_total",
        "Calls rejected by an open circuit breaker"
    );
}

/// Record one inbound webhook outcome.
pub fn record_webhook(kind: &'static str, outcome: &'static str) {
    metrics::counter!("steeple_webhooks_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}

/// Record one outbound send outcome.
pub fn record_send(outcome: &'static str) {
    metrics::counter!("steeple_sends_total", "outcome" => outcome).increment(1);
}

/// Record a dead letter write.
pub fn record_dead_letter(category: &str) {
    metrics::counter!("steeple_dead_letters_total", "category" => category.to_string())
        .increment(1);
}

/// Record one delivery receipt outcome.
pub fn record_receipt(outcome: &'static str) {
    metrics::counter!("steeple_receipts_total", "outcome" => outcome).increment(1);
}

/// Publish the current breaker state for one dependency.
pub fn set_breaker_state(dependency: &str, state: f64) {
    metrics::gauge!("steeple_breaker_state", "dependency" => dependency.to_string())
        .set(state);
}

/// Record a breaker fast-fail rejection.
pub fn record_breaker_rejection(dependency: &str) {
    metrics::counter!(
        "steeple_breaker_rejections_total",
        "dependency" => dependency.to_string()
    )
    .increment(1);
}
