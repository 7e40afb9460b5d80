// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound send pipeline.
//!
//! Wraps the provider send call in the retry executor (messaging
//! profile), which itself wraps calls gated by the provider circuit
//! breaker. Exhausted retries and circuit-open rejections land in the
//! dead letter store; callers choose between the erroring [`send`] and
//! the fire-and-forget [`send_best_effort`].
//!
//! [`send`]: SendPipeline::send
//! [`send_best_effort`]: SendPipeline::send_best_effort

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use steeple_core::phone::normalize_phone;
use steeple_core::types::{
    ConversationMessage, DeadLetterCategory, DeliveryState, Direction, SendReceipt,
    SendRequest,
};
use steeple_core::{NotificationSink, SendApi, SteepleError, TenantStore};
use steeple_resilience::{with_retry, CircuitBreaker, RetryFailure, RetryPolicy};
use steeple_storage::{DeadLetterStore, TenantDb, TenantHandle, TenantResolver};

use crate::now_rfc3339;
use crate::reconcile::RouteCache;

/// Replay attempts after which a pending send failure is written off.
const REPLAY_RETRY_LIMIT: u32 = 10;

/// Snapshot of the original send arguments, kept in the dead letter
/// payload so an operator replay can re-drive the exact call.
#[derive(Debug, Serialize, Deserialize)]
struct SendFailurePayload {
    tenant_id: String,
    conversation_id: Option<String>,
    request: SendRequest,
}

/// Result of one operator-triggered replay pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub attempted: usize,
    pub resolved: usize,
    pub dead: usize,
}

/// The outbound half of the gateway.
pub struct SendPipeline {
    api: Arc<dyn SendApi>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    dead_letters: DeadLetterStore,
    route_cache: Arc<RouteCache>,
    notifier: Arc<dyn NotificationSink>,
}

impl SendPipeline {
    pub fn new(
        api: Arc<dyn SendApi>,
        breaker: Arc<CircuitBreaker>,
        retry: RetryPolicy,
        dead_letters: DeadLetterStore,
        route_cache: Arc<RouteCache>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            api,
            breaker,
            retry,
            dead_letters,
            route_cache,
            notifier,
        }
    }

    /// Send a message within a conversation.
    ///
    /// On success the outbound [`ConversationMessage`] is persisted with
    /// `delivery_status = pending` and the route cache learns the
    /// provider message id. On exhausted retries or circuit-open
    /// rejection a `send-failure` dead letter is written and a typed
    /// delivery error surfaces to the caller.
    pub async fn send(
        &self,
        tenant: &TenantHandle,
        conversation_id: &str,
        to: &str,
        body: &str,
        media: &[String],
    ) -> Result<String, SteepleError> {
        let request = SendRequest {
            from: tenant.tenant.provider_phone.clone(),
            to: normalize_phone(to),
            body: body.to_string(),
            media: media.to_vec(),
        };

        match self.attempt(&request).await {
            Ok(receipt) => {
                self.persist_outbound(
                    &tenant.store,
                    tenant.tenant_id(),
                    conversation_id,
                    &request,
                    &receipt.provider_message_id,
                )
                .await?;
                steeple_metrics::record_send("success");
                Ok(receipt.provider_message_id)
            }
            Err(failure) => {
                let error_text = failure.error.to_string();
                self.capture_failure(
                    tenant.tenant_id(),
                    Some(conversation_id),
                    &request,
                    &error_text,
                    failure.retries_used,
                )
                .await;
                Err(SteepleError::DeliveryFailed(error_text))
            }
        }
    }

    /// Fire-and-forget send for best-effort traffic such as auto-replies.
    ///
    /// Never errors to the caller: failures are dead-lettered and logged.
    /// No conversation record is written.
    pub async fn send_best_effort(&self, tenant: &TenantHandle, to: &str, body: &str) {
        let request = SendRequest {
            from: tenant.tenant.provider_phone.clone(),
            to: normalize_phone(to),
            body: body.to_string(),
            media: Vec::new(),
        };

        match self.attempt(&request).await {
            Ok(receipt) => {
                debug!(
                    to = %request.to,
                    provider_message_id = %receipt.provider_message_id,
                    "best-effort send accepted"
                );
                steeple_metrics::record_send("success");
            }
            Err(failure) => {
                warn!(to = %request.to, error = %failure.error, "best-effort send failed");
                let error_text = failure.error.to_string();
                self.capture_failure(
                    tenant.tenant_id(),
                    None,
                    &request,
                    &error_text,
                    failure.retries_used,
                )
                .await;
            }
        }
    }

    /// Re-drive pending `send-failure` dead letters through the normal
    /// send path. Successes are marked resolved (and their conversation
    /// message persisted, when the original call had one); repeated
    /// failures are written off after [`REPLAY_RETRY_LIMIT`] attempts.
    pub async fn replay_send_failures(
        &self,
        resolver: &TenantResolver,
    ) -> Result<ReplayReport, SteepleError> {
        let mut report = ReplayReport::default();

        for entry in self.dead_letters.list_pending().await? {
            if entry.category != DeadLetterCategory::SendFailure {
                continue;
            }
            report.attempted += 1;

            let payload: SendFailurePayload = match serde_json::from_str(&entry.payload) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(id = %entry.id, error = %err, "unreadable dead letter payload, writing off");
                    self.dead_letters.mark_dead(&entry.id).await?;
                    report.dead += 1;
                    continue;
                }
            };

            match self.attempt(&payload.request).await {
                Ok(receipt) => {
                    if let Some(conversation_id) = &payload.conversation_id {
                        let store = resolver.open_handle(&payload.tenant_id).await?;
                        self.persist_outbound(
                            &store,
                            &payload.tenant_id,
                            conversation_id,
                            &payload.request,
                            &receipt.provider_message_id,
                        )
                        .await?;
                    }
                    self.dead_letters.mark_resolved(&entry.id).await?;
                    debug!(id = %entry.id, "dead letter replayed successfully");
                    report.resolved += 1;
                }
                Err(failure) => {
                    warn!(id = %entry.id, error = %failure.error, "dead letter replay failed");
                    self.dead_letters.record_replay_attempt(&entry.id).await?;
                    if let Some(updated) = self.dead_letters.get(&entry.id).await? {
                        if updated.retry_count >= REPLAY_RETRY_LIMIT {
                            self.dead_letters.mark_dead(&entry.id).await?;
                            report.dead += 1;
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// One provider call behind the breaker, retried per policy.
    async fn attempt(&self, request: &SendRequest) -> Result<SendReceipt, RetryFailure> {
        let result = with_retry("provider-send", &self.retry, || {
            self.breaker.execute(|| self.api.send_message(request))
        })
        .await;

        if let Err(failure) = &result {
            if matches!(failure.error, SteepleError::CircuitOpen { .. }) {
                steeple_metrics::record_breaker_rejection(self.breaker.name());
            }
        }
        steeple_metrics::set_breaker_state(
            self.breaker.name(),
            match self.breaker.state() {
                steeple_resilience::CircuitState::Closed => 0.0,
                steeple_resilience::CircuitState::HalfOpen => 1.0,
                steeple_resilience::CircuitState::Open => 2.0,
            },
        );
        result
    }

    async fn persist_outbound(
        &self,
        store: &TenantDb,
        tenant_id: &str,
        conversation_id: &str,
        request: &SendRequest,
        provider_message_id: &str,
    ) -> Result<(), SteepleError> {
        let media_refs = if request.media.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&request.media).map_err(|e| {
                SteepleError::Internal(format!("media refs not serializable: {e}"))
            })?)
        };
        let message = ConversationMessage {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            direction: Direction::Outbound,
            content: request.body.clone(),
            media_refs,
            provider_message_id: Some(provider_message_id.to_string()),
            delivery_status: Some(DeliveryState::Pending),
            created_at: now_rfc3339(),
        };
        store.insert_message(&message).await?;
        self.route_cache.record(provider_message_id, tenant_id);
        Ok(())
    }

    async fn capture_failure(
        &self,
        tenant_id: &str,
        conversation_id: Option<&str>,
        request: &SendRequest,
        error_text: &str,
        retries_used: u32,
    ) {
        let payload = SendFailurePayload {
            tenant_id: tenant_id.to_string(),
            conversation_id: conversation_id.map(str::to_string),
            request: request.clone(),
        };
        let payload = match serde_json::to_value(&payload) {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, "send failure payload not serializable");
                return;
            }
        };

        match self
            .dead_letters
            .record(DeadLetterCategory::SendFailure, payload, error_text, retries_used)
            .await
        {
            Ok(entry) => {
                steeple_metrics::record_dead_letter("send-failure");
                self.notifier
                    .notify(
                        "dead-letter",
                        &format!(
                            "send to {} for tenant {tenant_id} failed after {retries_used} \
                             retries: {error_text} (entry {})",
                            request.to, entry.id
                        ),
                    )
                    .await;
            }
            Err(err) => {
                // The failure is now only in the logs; nothing else to do.
                error!(error = %err, tenant_id, "failed to record send-failure dead letter");
            }
        }
        steeple_metrics::record_send("dead-lettered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use steeple_core::types::{DeadLetterStatus, Member, Tenant};
    use steeple_resilience::BreakerConfig;
    use steeple_storage::RegistryStore;
    use tempfile::tempdir;

    use crate::notify::NullNotifier;

    /// Scripted [`SendApi`]: pops one outcome per call.
    struct ScriptedApi {
        outcomes: tokio::sync::Mutex<VecDeque<Result<String, u16>>>,
        calls: AtomicU32,
    }

    impl ScriptedApi {
        fn new(outcomes: Vec<Result<String, u16>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: tokio::sync::Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SendApi for ScriptedApi {
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
                None => panic!("ScriptedApi ran out of outcomes"),
            }
        }
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    struct Fixture {
        registry: Arc<RegistryStore>,
        resolver: Arc<TenantResolver>,
        tenant: TenantHandle,
        conversation_id: String,
        route_cache: Arc<RouteCache>,
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
                phone_hash: "hash-1".into(),
                phone: "+15552223333".into(),
                created_at: "2026-01-01T00:00:00.000Z".into(),
            })
            .await
            .unwrap();
        let conversation = tenant.store.find_or_create_conversation("m1").await.unwrap();

        Fixture {
            registry,
            resolver,
            conversation_id: conversation.id,
            tenant,
            route_cache: Arc::new(RouteCache::new(Duration::from_secs(3600))),
            _dir: dir,
        }
    }

    fn pipeline(fixture: &Fixture, api: Arc<ScriptedApi>, retry: RetryPolicy) -> SendPipeline {
        SendPipeline::new(
            api,
            Arc::new(CircuitBreaker::new("sms-provider", BreakerConfig::default())),
            retry,
            fixture.registry.dead_letters(),
            Arc::clone(&fixture.route_cache),
            Arc::new(NullNotifier),
        )
    }

    #[tokio::test]
    async fn success_persists_pending_message_and_route() {
        let fixture = fixture().await;
        let api = ScriptedApi::new(vec![Ok("prov-ok".into())]);
        let pipeline = pipeline(&fixture, Arc::clone(&api), fast_retry(2));

        let id = pipeline
            .send(
                &fixture.tenant,
                &fixture.conversation_id,
                "+15552223333",
                "Service moved to 11am",
                &[],
            )
            .await
            .unwrap();
        assert_eq!(id, "prov-ok");
        assert_eq!(api.calls(), 1);

        let message = fixture
            .tenant
            .store
            .find_message_by_provider_id("prov-ok")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.direction, Direction::Outbound);
        assert_eq!(message.delivery_status, Some(DeliveryState::Pending));
        assert_eq!(fixture.route_cache.lookup("prov-ok").as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn exhausted_retries_write_one_dead_letter() {
        let fixture = fixture().await;
        // maxRetries = 2 and three straight 503s: one dead letter with
        // retry_count 2, no fourth attempt.
        let api = ScriptedApi::new(vec![Err(503), Err(503), Err(503)]);
        let pipeline = pipeline(&fixture, Arc::clone(&api), fast_retry(2));

        let err = pipeline
            .send(
                &fixture.tenant,
                &fixture.conversation_id,
                "+15552223333",
                "hello",
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SteepleError::DeliveryFailed(_)));
        assert_eq!(api.calls(), 3);

        let dead_letters = fixture.registry.dead_letters();
        let pending = dead_letters.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].category, DeadLetterCategory::SendFailure);
        assert_eq!(pending[0].retry_count, 2);
        assert!(pending[0].error.contains("503"));
    }

    #[tokio::test]
    async fn permanent_error_dead_letters_without_retry() {
        let fixture = fixture().await;
        let api = ScriptedApi::new(vec![Err(422)]);
        let pipeline = pipeline(&fixture, Arc::clone(&api), fast_retry(3));

        let err = pipeline
            .send(
                &fixture.tenant,
                &fixture.conversation_id,
                "+15552223333",
                "hello",
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SteepleError::DeliveryFailed(_)));
        assert_eq!(api.calls(), 1);

        let pending = fixture.registry.dead_letters().list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].retry_count, 0);
    }

    #[tokio::test]
    async fn open_breaker_rejects_without_calling_the_api() {
        let fixture = fixture().await;
        let api = ScriptedApi::new(vec![]);
        let breaker = Arc::new(CircuitBreaker::new(
            "sms-provider",
            BreakerConfig {
                failure_threshold: 1,
                reset_timeout: Duration::from_secs(60),
                half_open_probes: 1,
            },
        ));
        // Trip the breaker.
        let _ = breaker
            .execute(|| async {
                Err::<(), _>(SteepleError::Provider {
                    message: "503".into(),
                    status: Some(503),
                    source: None,
                })
            })
            .await;

        let pipeline = SendPipeline::new(
            Arc::clone(&api) as Arc<dyn SendApi>,
            breaker,
            fast_retry(3),
            fixture.registry.dead_letters(),
            Arc::clone(&fixture.route_cache),
            Arc::new(NullNotifier),
        );

        let err = pipeline
            .send(
                &fixture.tenant,
                &fixture.conversation_id,
                "+15552223333",
                "hello",
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SteepleError::DeliveryFailed(_)));
        // The wrapped call never ran and the retry executor did not spin.
        assert_eq!(api.calls(), 0);
        assert_eq!(
            fixture.registry.dead_letters().list_pending().await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn best_effort_send_swallows_failure_but_dead_letters_it() {
        let fixture = fixture().await;
        let api = ScriptedApi::new(vec![Err(503)]);
        let pipeline = pipeline(&fixture, Arc::clone(&api), fast_retry(0));

        pipeline
            .send_best_effort(&fixture.tenant, "+15552223333", "welcome text")
            .await;

        let pending = fixture.registry.dead_letters().list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].retry_count, 0);
        // No conversation message was written for the best-effort send.
        let messages = fixture
            .tenant
            .store
            .list_messages(&fixture.conversation_id)
            .await
            .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn replay_resolves_entry_and_persists_message() {
        let fixture = fixture().await;
        let api = ScriptedApi::new(vec![Err(503), Ok("prov-replayed".into())]);
        let pipeline = pipeline(&fixture, Arc::clone(&api), fast_retry(0));

        // First send fails and dead-letters.
        let _ = pipeline
            .send(
                &fixture.tenant,
                &fixture.conversation_id,
                "+15552223333",
                "hello",
                &[],
            )
            .await;
        assert_eq!(
            fixture.registry.dead_letters().list_pending().await.unwrap().len(),
            1
        );

        // Replay succeeds, resolves the entry, persists the message.
        let report = pipeline.replay_send_failures(&fixture.resolver).await.unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.dead, 0);

        assert!(fixture.registry.dead_letters().list_pending().await.unwrap().is_empty());
        let message = fixture
            .tenant
            .store
            .find_message_by_provider_id("prov-replayed")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.delivery_status, Some(DeliveryState::Pending));
    }

    #[tokio::test]
    async fn failed_replay_keeps_entry_pending_and_counts_attempt() {
        let fixture = fixture().await;
        let api = ScriptedApi::new(vec![Err(503), Err(503)]);
        let pipeline = pipeline(&fixture, Arc::clone(&api), fast_retry(0));

        let _ = pipeline
            .send(
                &fixture.tenant,
                &fixture.conversation_id,
                "+15552223333",
                "hello",
                &[],
            )
            .await;

        let report = pipeline.replay_send_failures(&fixture.resolver).await.unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.resolved, 0);

        let pending = fixture.registry.dead_letters().list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].retry_count, 1);
        assert_eq!(pending[0].status, DeadLetterStatus::Pending);
    }
}
