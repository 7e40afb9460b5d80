// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook processing.
//!
//! Turns a verified provider webhook into conversation and message
//! records. Signature failures are rejected outright; everything after
//! verification resolves to an acknowledged terminal outcome so the
//! provider never retry-storms us. Internal failures past that point are
//! captured to the dead letter store before acknowledging.

use std::sync::Arc;

use tracing::{debug, error, warn};

use steeple_core::phone::search_hash;
use steeple_core::types::{ConversationMessage, DeadLetterCategory, Direction};
use steeple_core::{SteepleError, TenantStore};
use steeple_provider::{parse_webhook, InboundSms, SignatureVerifier, WebhookEvent};
use steeple_storage::{DeadLetterStore, TenantResolver};

use crate::now_rfc3339;
use crate::outbound::SendPipeline;

/// Terminal outcome of one inbound webhook event. Every variant is
/// acknowledged to the provider with a 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The message was appended to a conversation.
    Processed {
        conversation_id: String,
        message_id: String,
    },
    /// The provider message id was already in the tenant store
    /// (provider retry); nothing was written.
    Duplicate,
    /// No tenant owns the recipient number.
    UnknownTenant,
    /// The sender is not a member; an auto-reply was dispatched and no
    /// conversation was created.
    NonMember,
    /// An event type this processor does not handle.
    Ignored { event_type: String },
    /// Processing failed after verification; the event was captured to
    /// the dead letter store (id present unless even that write failed).
    Deferred { dead_letter_id: Option<String> },
}

/// Webhook-to-records processor for message events.
pub struct InboundProcessor {
    verifier: SignatureVerifier,
    resolver: Arc<TenantResolver>,
    pipeline: Arc<SendPipeline>,
    dead_letters: DeadLetterStore,
    auto_reply: String,
}

impl InboundProcessor {
    pub fn new(
        verifier: SignatureVerifier,
        resolver: Arc<TenantResolver>,
        pipeline: Arc<SendPipeline>,
        dead_letters: DeadLetterStore,
        auto_reply: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            resolver,
            pipeline,
            dead_letters,
            auto_reply: auto_reply.into(),
        }
    }

    /// Process one raw webhook delivery.
    ///
    /// Errors out only for authentication (bad signature) and validation
    /// (malformed body) failures; those map to 401 and 400 upstream.
    /// Everything else is a terminal [`InboundOutcome`].
    pub async fn process(
        &self,
        raw_body: &[u8],
        signature: &str,
        timestamp: &str,
    ) -> Result<InboundOutcome, SteepleError> {
        if !self.verifier.verify(raw_body, signature, timestamp) {
            warn!("inbound webhook rejected: signature verification failed");
            return Err(SteepleError::Authentication(
                "webhook signature rejected".into(),
            ));
        }

        let sms = match parse_webhook(raw_body)? {
            WebhookEvent::MessageReceived(sms) => sms,
            WebhookEvent::DeliveryReceipt(_) => {
                // Receipts have their own endpoint; acknowledge and move on.
                debug!("delivery receipt on message endpoint, ignoring");
                steeple_metrics::record_webhook("message", "ignored");
                return Ok(InboundOutcome::Ignored {
                    event_type: steeple_provider::EVENT_DELIVERY_UPDATE.to_string(),
                });
            }
            WebhookEvent::Unknown { event_type } => {
                debug!(event_type, "unhandled webhook event type, ignoring");
                steeple_metrics::record_webhook("message", "ignored");
                return Ok(InboundOutcome::Ignored { event_type });
            }
        };

        match self.apply(&sms).await {
            Ok(outcome) => {
                steeple_metrics::record_webhook("message", outcome_label(&outcome));
                Ok(outcome)
            }
            Err(err) => {
                // Persistence or resolution broke mid-pipeline. The
                // provider still gets its acknowledgment; the event is
                // preserved for operator replay instead of being lost.
                error!(error = %err, "inbound processing failed, capturing to dead letters");
                let dead_letter_id = self.capture(raw_body, &sms, &err).await;
                steeple_metrics::record_webhook("message", "deferred");
                Ok(InboundOutcome::Deferred { dead_letter_id })
            }
        }
    }

    async fn apply(&self, sms: &InboundSms) -> Result<InboundOutcome, SteepleError> {
        // The parser guarantees at least one recipient.
        let recipient = sms.to.first().map(String::as_str).unwrap_or_default();

        let Some(tenant) = self.resolver.resolve_by_phone(recipient).await? else {
            debug!(recipient, "inbound for unclaimed number, acknowledging");
            return Ok(InboundOutcome::UnknownTenant);
        };

        if let Some(provider_message_id) = &sms.provider_message_id {
            if tenant
                .store
                .find_message_by_provider_id(provider_message_id)
                .await?
                .is_some()
            {
                debug!(provider_message_id, "duplicate delivery, acknowledging");
                return Ok(InboundOutcome::Duplicate);
            }
        }

        let sender_hash = search_hash(&sms.from);
        let Some(member) = tenant.store.find_member_by_phone_hash(&sender_hash).await? else {
            debug!(tenant_id = tenant.tenant_id(), "sender is not a member, auto-replying");
            // Background submission: the reply rides the send pipeline,
            // whose dead letter capture is its error channel. The
            // webhook response does not wait for provider latency.
            let pipeline = Arc::clone(&self.pipeline);
            let reply_tenant = tenant.clone();
            let reply_to = sms.from.clone();
            let reply_body = self.auto_reply.clone();
            tokio::spawn(async move {
                pipeline
                    .send_best_effort(&reply_tenant, &reply_to, &reply_body)
                    .await;
            });
            return Ok(InboundOutcome::NonMember);
        };

        let conversation = tenant.store.find_or_create_conversation(&member.id).await?;
        let message = ConversationMessage {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation.id.clone(),
            direction: Direction::Inbound,
            content: sms.text.clone(),
            media_refs: if sms.media.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&sms.media).map_err(|e| {
                    SteepleError::Internal(format!("media refs not serializable: {e}"))
                })?)
            },
            provider_message_id: sms.provider_message_id.clone(),
            delivery_status: None,
            created_at: now_rfc3339(),
        };

        if let Err(err) = tenant.store.insert_message(&message).await {
            // A concurrent delivery of the same event can beat us to the
            // unique provider_message_id; re-check before treating the
            // insert failure as real.
            if let Some(provider_message_id) = &sms.provider_message_id {
                if tenant
                    .store
                    .find_message_by_provider_id(provider_message_id)
                    .await
                    .ok()
                    .flatten()
                    .is_some()
                {
                    debug!(provider_message_id, "lost idempotency race, acknowledging");
                    return Ok(InboundOutcome::Duplicate);
                }
            }
            return Err(err);
        }

        debug!(
            tenant_id = tenant.tenant_id(),
            conversation_id = %conversation.id,
            message_id = %message.id,
            "inbound message recorded"
        );
        Ok(InboundOutcome::Processed {
            conversation_id: conversation.id,
            message_id: message.id,
        })
    }

    /// Preserve a failed event for operator follow-up. Returns the dead
    /// letter id, or `None` if even that write failed (logged).
    async fn capture(
        &self,
        raw_body: &[u8],
        sms: &InboundSms,
        err: &SteepleError,
    ) -> Option<String> {
        let payload = serde_json::json!({
            "provider_message_id": sms.provider_message_id,
            "from": sms.from,
            "to": sms.to,
            "raw_body": String::from_utf8_lossy(raw_body),
        });
        match self
            .dead_letters
            .record(
                DeadLetterCategory::InboundProcessingFailure,
                payload,
                &err.to_string(),
                0,
            )
            .await
        {
            Ok(entry) => {
                steeple_metrics::record_dead_letter("inbound-processing-failure");
                Some(entry.id)
            }
            Err(record_err) => {
                error!(error = %record_err, "failed to dead-letter inbound event");
                None
            }
        }
    }
}

fn outcome_label(outcome: &InboundOutcome) -> &'static str {
    match outcome {
        InboundOutcome::Processed { .. } => "processed",
        InboundOutcome::Duplicate => "duplicate",
        InboundOutcome::UnknownTenant => "unknown-tenant",
        InboundOutcome::NonMember => "non-member",
        InboundOutcome::Ignored { .. } => "ignored",
        InboundOutcome::Deferred { .. } => "deferred",
    }
}
