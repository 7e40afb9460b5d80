// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the provider's send API.
//!
//! Deliberately thin: no retry and no breaker here. Fault tolerance is
//! layered on by the outbound send pipeline, which wraps this client in
//! the circuit breaker and retry executor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use steeple_core::types::{SendReceipt, SendRequest};
use steeple_core::{SendApi, SteepleError};

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    from: &'a str,
    to: &'a str,
    text: &'a str,
    media_urls: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    data: SendResponseData,
}

#[derive(Debug, Deserialize)]
struct SendResponseData {
    id: String,
}

/// reqwest-backed [`SendApi`] implementation.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProviderClient {
    /// Build a client for the provider API at `base_url`, authenticating
    /// with `api_key` as a bearer token.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, SteepleError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| SteepleError::Config(format!("invalid API key header value: {e}")))?;
        headers.insert("authorization", bearer);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SteepleError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SendApi for ProviderClient {
    async fn send_message(
        &self,
        request: &SendRequest,
    ) -> Result<SendReceipt, SteepleError> {
        let body = SendBody {
            from: &request.from,
            to: &request.to,
            text: &request.body,
            media_urls: &request.media,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SteepleError::Provider {
                message: format!("send request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, to = %request.to, "provider send response");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SteepleError::Provider {
                message: format!("provider returned {status}: {text}"),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        let parsed: SendResponse =
            response.json().await.map_err(|e| SteepleError::Provider {
                message: format!("provider response was not the expected shape: {e}"),
                status: Some(status.as_u16()),
                source: Some(Box::new(e)),
            })?;

        Ok(SendReceipt {
            provider_message_id: parsed.data.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steeple_core::FailureClass;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_request() -> SendRequest {
        SendRequest {
            from: "+15550001111".into(),
            to: "+15552223333".into(),
            body: "Service moved to 11am".into(),
            media: vec![],
        }
    }

    #[tokio::test]
    async fn successful_send_returns_provider_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "from": "+15550001111",
                "to": "+15552223333",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"id": "prov-abc"}
            })))
            .mount(&server)
            .await;

        let client = ProviderClient::new(&server.uri(), "test-key").unwrap();
        let receipt = client.send_message(&make_request()).await.unwrap();
        assert_eq!(receipt.provider_message_id, "prov-abc");
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ProviderClient::new(&server.uri(), "test-key").unwrap();
        let err = client.send_message(&make_request()).await.unwrap_err();
        assert_eq!(err.classify(), FailureClass::Transient);
        assert!(matches!(
            err,
            SteepleError::Provider { status: Some(503), .. }
        ));
    }

    #[tokio::test]
    async fn client_error_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"error": "invalid number"})),
            )
            .mount(&server)
            .await;

        let client = ProviderClient::new(&server.uri(), "test-key").unwrap();
        let err = client.send_message(&make_request()).await.unwrap_err();
        assert_eq!(err.classify(), FailureClass::Permanent);
    }

    #[tokio::test]
    async fn rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = ProviderClient::new(&server.uri(), "test-key").unwrap();
        let err = client.send_message(&make_request()).await.unwrap_err();
        assert_eq!(err.classify(), FailureClass::Transient);
    }

    #[tokio::test]
    async fn connect_failure_is_transient_with_no_status() {
        // Nothing listens on this port.
        let client = ProviderClient::new("http://127.0.0.1:9", "test-key").unwrap();
        let err = client.send_message(&make_request()).await.unwrap_err();
        assert_eq!(err.classify(), FailureClass::Transient);
        assert!(matches!(err, SteepleError::Provider { status: None, .. }));
    }

    #[tokio::test]
    async fn media_urls_are_sent_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(serde_json::json!({
                "media_urls": ["https://cdn.example/pic.jpg"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"id": "prov-mms"}
            })))
            .mount(&server)
            .await;

        let client = ProviderClient::new(&server.uri(), "test-key").unwrap();
        let mut request = make_request();
        request.media = vec!["https://cdn.example/pic.jpg".into()];
        let receipt = client.send_message(&request).await.unwrap();
        assert_eq!(receipt.provider_message_id, "prov-mms");
    }
}
