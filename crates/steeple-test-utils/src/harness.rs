// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete gateway stack against temp
//! SQLite stores: registry, one seeded tenant and member, the resilience
//! stack, mock send API, capturing notifier, inbound processor, and
//! delivery reconciler. It also owns a signing key so tests can produce
//! valid provider webhook signatures.

use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::{Signer, SigningKey};

use steeple_core::phone::search_hash;
use steeple_core::types::{Member, Tenant};
use steeple_core::{NotificationSink, SendApi, SteepleError, TenantStore};
use steeple_messaging::{
    DeliveryReconciler, InboundProcessor, RouteCache, SendPipeline,
};
use steeple_provider::SignatureVerifier;
use steeple_resilience::{BreakerConfig, CircuitBreaker, RetryPolicy};
use steeple_storage::{RegistryStore, TenantHandle, TenantResolver};

use crate::mock_notify::CapturingSink;
use crate::mock_send::{MockSendApi, SendOutcome};

/// The seeded tenant's provider-assigned number.
pub const TENANT_PHONE: &str = "+15550001111";

/// The seeded member's phone number.
pub const MEMBER_PHONE: &str = "+15552223333";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    send_outcomes: Vec<SendOutcome>,
    retry: RetryPolicy,
    breaker: BreakerConfig,
    auto_reply: String,
    replay_window_secs: i64,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            send_outcomes: Vec::new(),
            // Fast-by-default so tests never sleep meaningfully.
            retry: RetryPolicy {
                max_retries: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                backoff_multiplier: 1.0,
                jitter_factor: 0.0,
            },
            breaker: BreakerConfig::default(),
            auto_reply: "Ask a staff member to add your number, then text again."
                .to_string(),
            replay_window_secs: 300,
        }
    }

    /// Script the mock provider's send outcomes.
    pub fn with_send_outcomes(mut self, outcomes: Vec<SendOutcome>) -> Self {
        self.send_outcomes = outcomes;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_breaker_config(mut self, breaker: BreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_auto_reply(mut self, auto_reply: impl Into<String>) -> Self {
        self.auto_reply = auto_reply.into();
        self
    }

    /// Build the harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, SteepleError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| SteepleError::Storage { source: e.into() })?;
        let registry_path = temp_dir.path().join("registry.db");
        let tenant_dir = temp_dir.path().join("tenants");
        std::fs::create_dir_all(&tenant_dir)
            .map_err(|e| SteepleError::Storage { source: e.into() })?;

        let registry = Arc::new(
            RegistryStore::open(&registry_path.to_string_lossy()).await?,
        );
        registry
            .create_tenant(&Tenant {
                id: "t1".into(),
                name: "First Church".into(),
                provider_phone: TENANT_PHONE.into(),
                created_at: "2026-01-01T00:00:00.000Z".into(),
            })
            .await?;

        let resolver = Arc::new(TenantResolver::new(Arc::clone(&registry), &tenant_dir));
        let tenant = resolver
            .resolve_by_phone(TENANT_PHONE)
            .await?
            .ok_or_else(|| SteepleError::Internal("seeded tenant not resolvable".into()))?;
        tenant
            .store
            .insert_member(&Member {
                id: "m1".into(),
                display_name: "Pat Example".into(),
                phone_hash: search_hash(MEMBER_PHONE),
                phone: MEMBER_PHONE.into(),
                created_at: "2026-01-01T00:00:00.000Z".into(),
            })
            .await?;

        let send_api = Arc::new(MockSendApi::with_outcomes(self.send_outcomes));
        let notifier = Arc::new(CapturingSink::new());
        let breaker = Arc::new(CircuitBreaker::new("sms-provider", self.breaker));
        let route_cache = Arc::new(RouteCache::new(Duration::from_secs(3600)));

        let pipeline = Arc::new(SendPipeline::new(
            Arc::clone(&send_api) as Arc<dyn SendApi>,
            Arc::clone(&breaker),
            self.retry,
            registry.dead_letters(),
            Arc::clone(&route_cache),
            Arc::clone(&notifier) as Arc<dyn NotificationSink>,
        ));

        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        let verifier =
            SignatureVerifier::from_key(signing_key.verifying_key(), self.replay_window_secs);

        let inbound = Arc::new(InboundProcessor::new(
            verifier,
            Arc::clone(&resolver),
            Arc::clone(&pipeline),
            registry.dead_letters(),
            self.auto_reply,
        ));
        let reconciler = Arc::new(DeliveryReconciler::new(
            Arc::clone(&resolver),
            Arc::clone(&route_cache),
        ));

        Ok(TestHarness {
            registry,
            resolver,
            tenant,
            send_api,
            notifier,
            breaker,
            route_cache,
            pipeline,
            inbound,
            reconciler,
            signing_key,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    pub registry: Arc<RegistryStore>,
    pub resolver: Arc<TenantResolver>,
    /// Handle for the seeded tenant `t1`.
    pub tenant: TenantHandle,
    pub send_api: Arc<MockSendApi>,
    pub notifier: Arc<CapturingSink>,
    pub breaker: Arc<CircuitBreaker>,
    pub route_cache: Arc<RouteCache>,
    pub pipeline: Arc<SendPipeline>,
    pub inbound: Arc<InboundProcessor>,
    pub reconciler: Arc<DeliveryReconciler>,
    signing_key: SigningKey,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The verifying key matching the harness signing key, hex-encoded.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a raw webhook body the way the provider does. Returns the
    /// `signature` and `timestamp` header values.
    pub fn sign_webhook(&self, raw_body: &[u8]) -> (String, String) {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.sign_webhook_at(raw_body, &timestamp)
    }

    /// Sign with an explicit timestamp (for replay-window tests).
    pub fn sign_webhook_at(&self, raw_body: &[u8], timestamp: &str) -> (String, String) {
        let mut message = Vec::with_capacity(timestamp.len() + 1 + raw_body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.push(b'|');
        message.extend_from_slice(raw_body);
        let signature = hex::encode(self.signing_key.sign(&message).to_bytes());
        (signature, timestamp.to_string())
    }

    /// A signed message-received webhook body for the given sender.
    pub fn message_event(
        &self,
        provider_message_id: &str,
        from: &str,
        text: &str,
    ) -> Vec<u8> {
        serde_json::json!({
            "event_type": "message.received",
            "payload": {
                "id": provider_message_id,
                "from": {"phone_number": from},
                "to": [{"phone_number": TENANT_PHONE}],
                "text": text,
                "media": []
            }
        })
        .to_string()
        .into_bytes()
    }

    /// A delivery-receipt webhook body.
    pub fn receipt_event(&self, provider_message_id: &str, status: &str) -> Vec<u8> {
        serde_json::json!({
            "type": "message.delivery.updated",
            "data": {"payload": [{"id": provider_message_id, "status": status}]}
        })
        .to_string()
        .into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_builds_and_signs_verifiably() {
        let harness = TestHarness::builder().build().await.unwrap();
        let body = harness.message_event("prov-1", MEMBER_PHONE, "Hello");
        let (signature, timestamp) = harness.sign_webhook(&body);

        let verifier = SignatureVerifier::from_hex_key(
            Some(&harness.public_key_hex()),
            300,
        );
        assert!(verifier.verify(&body, &signature, &timestamp));
    }
}
