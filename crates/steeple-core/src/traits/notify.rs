// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification sink collaborator for operational alerting.

use async_trait::async_trait;

/// Best-effort outbound alerting (e.g. a chat-ops webhook).
///
/// Infallible by contract: a sink that cannot deliver logs the problem
/// and returns. Failures here must never fail the caller.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver one operational event. `subject` is a short machine-ish
    /// tag ("dead-letter", "breaker-open"), `body` the human detail.
    async fn notify(&self, subject: &str, body: &str);
}
