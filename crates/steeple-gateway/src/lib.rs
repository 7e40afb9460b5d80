// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Steeple messaging gateway.
//!
//! Exposes the provider's two webhooks (inbound messages and delivery
//! receipts) plus unauthenticated `/health` and `/metrics`. Webhook
//! authentication is the provider's Ed25519 signature scheme, verified
//! against the exact raw bytes received.

pub mod handlers;
pub mod server;

pub use server::{router, start_server, GatewayState, HealthState, ServerConfig};

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use ed25519_dalek::{Signer, SigningKey};
    use tower::ServiceExt;

    use steeple_core::phone::search_hash;
    use steeple_core::types::{
        ConversationMessage, DeliveryState, Direction, Member, SendReceipt, SendRequest,
        Tenant,
    };
    use steeple_core::{SendApi, SteepleError, TenantStore};
    use steeple_messaging::{
        DeliveryReconciler, InboundProcessor, NullNotifier, RouteCache, SendPipeline,
    };
    use steeple_provider::SignatureVerifier;
    use steeple_resilience::{BreakerConfig, CircuitBreaker, RetryPolicy};
    use steeple_storage::{RegistryStore, TenantHandle, TenantResolver};
    use tempfile::tempdir;

    use super::*;

    struct OkApi {
        outcomes: tokio::sync::Mutex<VecDeque<Result<String, u16>>>,
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl SendApi for OkApi {
        async fn send_message(
            &self,
            _request: &SendRequest,
        ) -> Result<SendReceipt, SteepleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcomes.lock().await.pop_front() {
                Some(Ok(id)) => Ok(SendReceipt {
                    provider_message_id: id,
                }),
                Some(Err(status)) => Err(SteepleError::Provider {
                    message: format!("{status} from provider"),
                    status: Some(status),
                    source: None,
                }),
                None => Ok(SendReceipt {
                    provider_message_id: uuid::Uuid::new_v4().to_string(),
                }),
            }
        }
    }

    struct Fixture {
        router: axum::Router,
        tenant: TenantHandle,
        signing: SigningKey,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let registry = Arc::new(
            RegistryStore::open(dir.path().join("registry.db").to_str().unwrap())
                .await
                .unwrap(),
        );
        registry
            .create_tenant(&Tenant {
                id: "t1".into(),
                name: "First Church".into(),
                provider_phone: "+15550001111".into(),
                created_at: "2026-01-01T00:00:00.000Z".into(),
            })
            .await
            .unwrap();
        let resolver = Arc::new(TenantResolver::new(
            Arc::clone(&registry),
            dir.path().join("tenants"),
        ));
        std::fs::create_dir_all(dir.path().join("tenants")).unwrap();

        let tenant = resolver
            .resolve_by_phone("+15550001111")
            .await
            .unwrap()
            .unwrap();
        tenant
            .store
            .insert_member(&Member {
                id: "m1".into(),
                display_name: "Pat Example".into(),
                phone_hash: search_hash("+15552223333"),
                phone: "+15552223333".into(),
                created_at: "2026-01-01T00:00:00.000Z".into(),
            })
            .await
            .unwrap();

        let api = Arc::new(OkApi {
            outcomes: tokio::sync::Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
        });
        let route_cache = Arc::new(RouteCache::new(Duration::from_secs(3600)));
        let pipeline = Arc::new(SendPipeline::new(
            api as Arc<dyn SendApi>,
            Arc::new(CircuitBreaker::new("sms-provider", BreakerConfig::default())),
            RetryPolicy {
                max_retries: 0,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                backoff_multiplier: 1.0,
                jitter_factor: 0.0,
            },
            registry.dead_letters(),
            Arc::clone(&route_cache),
            Arc::new(NullNotifier),
        ));

        let signing = SigningKey::generate(&mut rand::rngs::OsRng);

        let inbound = Arc::new(InboundProcessor::new(
            SignatureVerifier::from_key(signing.verifying_key(), 300),
            Arc::clone(&resolver),
            pipeline,
            registry.dead_letters(),
            "Ask a staff member to add your number, then text again.",
        ));
        let reconciler = Arc::new(DeliveryReconciler::new(
            Arc::clone(&resolver),
            route_cache,
        ));

        let state = GatewayState {
            inbound,
            reconciler,
            verifier: Arc::new(SignatureVerifier::from_key(signing.verifying_key(), 300)),
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render: None,
            },
        };

        Fixture {
            router: router(state),
            tenant,
            signing,
            _dir: dir,
        }
    }

    fn sign(signing: &SigningKey, raw: &[u8]) -> (String, String) {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut message = Vec::new();
        message.extend_from_slice(timestamp.as_bytes());
        message.push(b'|');
        message.extend_from_slice(raw);
        (hex::encode(signing.sign(&message).to_bytes()), timestamp)
    }

    async fn post(
        router: &axum::Router,
        uri: &str,
        raw: Vec<u8>,
        signature: &str,
        timestamp: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("signature", signature)
                    .header("timestamp", timestamp)
                    .header("content-type", "application/json")
                    .body(Body::from(raw))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn message_body() -> Vec<u8> {
        serde_json::json!({
            "event_type": "message.received",
            "payload": {
                "id": "prov-http-1",
                "from": {"phone_number": "+15552223333"},
                "to": [{"phone_number": "+15550001111"}],
                "text": "Hello",
                "media": []
            }
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn signed_message_webhook_is_acknowledged_and_stored() {
        let fixture = fixture().await;
        let raw = message_body();
        let (sig, ts) = sign(&fixture.signing, &raw);

        let (status, json) =
            post(&fixture.router, "/webhooks/provider/messages", raw, &sig, &ts).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["received"], serde_json::json!(true));

        let stored = fixture
            .tenant
            .store
            .find_message_by_provider_id("prov-http-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.content, "Hello");
    }

    #[tokio::test]
    async fn unsigned_message_webhook_is_401() {
        let fixture = fixture().await;
        let raw = message_body();
        let (status, json) =
            post(&fixture.router, "/webhooks/provider/messages", raw, "bad", "0").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_signed_body_is_400() {
        let fixture = fixture().await;
        let raw = b"{not valid json".to_vec();
        let (sig, ts) = sign(&fixture.signing, &raw);
        let (status, _) =
            post(&fixture.router, "/webhooks/provider/messages", raw, &sig, &ts).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_webhook_delivery_still_acknowledges() {
        let fixture = fixture().await;
        let raw = message_body();
        let (sig, ts) = sign(&fixture.signing, &raw);

        let (first, _) = post(
            &fixture.router,
            "/webhooks/provider/messages",
            raw.clone(),
            &sig,
            &ts,
        )
        .await;
        let (second, json) =
            post(&fixture.router, "/webhooks/provider/messages", raw, &sig, &ts).await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::OK);
        assert_eq!(json["received"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn status_webhook_marks_delivery() {
        let fixture = fixture().await;

        // Seed an outbound message awaiting its receipt.
        let conversation = fixture
            .tenant
            .store
            .find_or_create_conversation("m1")
            .await
            .unwrap();
        fixture
            .tenant
            .store
            .insert_message(&ConversationMessage {
                id: "msg-out".into(),
                conversation_id: conversation.id,
                direction: Direction::Outbound,
                content: "Service moved to 11am".into(),
                media_refs: None,
                provider_message_id: Some("prov-out-1".into()),
                delivery_status: Some(DeliveryState::Pending),
                created_at: "2026-01-01T00:00:01.000Z".into(),
            })
            .await
            .unwrap();

        let raw = serde_json::json!({
            "type": "message.delivery.updated",
            "data": {"payload": [{"id": "prov-out-1", "status": "delivered"}]}
        })
        .to_string()
        .into_bytes();
        let (sig, ts) = sign(&fixture.signing, &raw);

        let (status, json) =
            post(&fixture.router, "/webhooks/provider/status", raw, &sig, &ts).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["received"], serde_json::json!(true));

        let updated = fixture
            .tenant
            .store
            .find_message_by_provider_id("prov-out-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.delivery_status, Some(DeliveryState::Delivered));
    }

    #[tokio::test]
    async fn status_webhook_for_unknown_id_still_acknowledges() {
        let fixture = fixture().await;
        let raw = serde_json::json!({
            "type": "message.delivery.updated",
            "data": {"payload": [{"id": "prov-nowhere", "status": "delivered"}]}
        })
        .to_string()
        .into_bytes();
        let (sig, ts) = sign(&fixture.signing, &raw);

        let (status, json) =
            post(&fixture.router, "/webhooks/provider/status", raw, &sig, &ts).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["received"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn health_endpoint_is_unauthenticated() {
        let fixture = fixture().await;
        let response = fixture
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_without_recorder_is_404() {
        let fixture = fixture().await;
        let response = fixture
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
