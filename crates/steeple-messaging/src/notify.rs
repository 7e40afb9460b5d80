// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-ops notification sinks.
//!
//! Best-effort by contract: a sink that cannot deliver logs the problem
//! and returns. Nothing here may fail the caller.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use steeple_core::NotificationSink;

/// Posts operational events to a chat-ops webhook (Slack-compatible
/// `{"text": ...}` body).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            // Builder only fails on TLS backend misconfiguration; fall
            // back to the default client rather than failing the caller.
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        let payload = serde_json::json!({"text": format!("[{subject}] {body}")});
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(subject, "operational notification delivered");
            }
            Ok(response) => {
                warn!(subject, status = %response.status(), "notification sink rejected event");
            }
            Err(err) => {
                warn!(subject, error = %err, "notification sink unreachable");
            }
        }
    }
}

/// Sink used when no chat-ops webhook is configured.
pub struct NullNotifier;

#[async_trait]
impl NotificationSink for NullNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        debug!(subject, body, "notification dropped (no sink configured)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_subject_and_body_to_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "text": "[dead-letter] send to +15552223333 failed"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri()));
        notifier
            .notify("dead-letter", "send to +15552223333 failed")
            .await;
    }

    #[tokio::test]
    async fn unreachable_sink_does_not_panic() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook");
        notifier.notify("dead-letter", "detail").await;
    }

    #[tokio::test]
    async fn rejected_event_does_not_panic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let notifier = WebhookNotifier::new(server.uri());
        notifier.notify("breaker-open", "sms-provider circuit opened").await;
    }
}
