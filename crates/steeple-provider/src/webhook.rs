// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed parsing of the provider's webhook envelopes.
//!
//! The provider sends a semi-stable JSON shape keyed by event type.
//! Parsing lands in a tagged union with an explicit `Unknown` variant;
//! unrecognized event types are safely ignored rather than reached into
//! with untyped field lookups.

use serde::Deserialize;

use steeple_core::types::DeliveryState;
use steeple_core::SteepleError;

/// Event type for an inbound message.
pub const EVENT_MESSAGE_RECEIVED: &str = "message.received";

/// Event type for an asynchronous delivery receipt.
pub const EVENT_DELIVERY_UPDATE: &str = "message.delivery.updated";

/// A parsed, recognized-or-not webhook event.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    MessageReceived(InboundSms),
    DeliveryReceipt(DeliveryReceipt),
    /// Anything we do not handle. Acknowledged and dropped.
    Unknown { event_type: String },
}

/// The interesting fields of a message-received event.
#[derive(Debug, Clone)]
pub struct InboundSms {
    /// The provider's message id, the inbound idempotency key.
    pub provider_message_id: Option<String>,
    /// Sender phone number.
    pub from: String,
    /// Recipient numbers; the first one identifies the tenant.
    pub to: Vec<String>,
    pub text: String,
    pub media: Vec<String>,
}

/// The interesting fields of a delivery-receipt event.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub provider_message_id: String,
    /// Raw provider status vocabulary; see [`map_delivery_status`].
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default, rename = "type")]
    type_: Option<String>,
    #[serde(default)]
    payload: Option<RawMessagePayload>,
    #[serde(default)]
    data: Option<RawReceiptData>,
}

#[derive(Debug, Deserialize)]
struct RawMessagePayload {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    from: Option<RawPhone>,
    #[serde(default)]
    to: Vec<RawPhone>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    media: Vec<RawMedia>,
}

#[derive(Debug, Deserialize)]
struct RawPhone {
    phone_number: String,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawReceiptData {
    #[serde(default)]
    payload: Vec<RawReceiptPayload>,
}

#[derive(Debug, Deserialize)]
struct RawReceiptPayload {
    id: String,
    status: String,
}

/// Parse a raw webhook body into a [`WebhookEvent`].
///
/// Returns `Validation` for bodies that are not JSON or that claim a
/// known event type but lack its required fields. Unknown event types
/// are not an error.
pub fn parse_webhook(raw_body: &[u8]) -> Result<WebhookEvent, SteepleError> {
    let envelope: RawEnvelope = serde_json::from_slice(raw_body)
        .map_err(|e| SteepleError::Validation(format!("malformed webhook body: {e}")))?;

    if envelope.event_type.as_deref() == Some(EVENT_MESSAGE_RECEIVED) {
        let payload = envelope.payload.ok_or_else(|| {
            SteepleError::Validation("message.received event missing payload".into())
        })?;
        let from = payload.from.ok_or_else(|| {
            SteepleError::Validation("message.received event missing sender".into())
        })?;
        if payload.to.is_empty() {
            return Err(SteepleError::Validation(
                "message.received event missing recipients".into(),
            ));
        }
        return Ok(WebhookEvent::MessageReceived(InboundSms {
            provider_message_id: payload.id,
            from: from.phone_number,
            to: payload.to.into_iter().map(|p| p.phone_number).collect(),
            text: payload.text.unwrap_or_default(),
            media: payload.media.into_iter().map(|m| m.url).collect(),
        }));
    }

    if envelope.type_.as_deref() == Some(EVENT_DELIVERY_UPDATE) {
        let data = envelope.data.ok_or_else(|| {
            SteepleError::Validation("delivery receipt missing data".into())
        })?;
        let receipt = data.payload.into_iter().next().ok_or_else(|| {
            SteepleError::Validation("delivery receipt missing payload".into())
        })?;
        return Ok(WebhookEvent::DeliveryReceipt(DeliveryReceipt {
            provider_message_id: receipt.id,
            status: receipt.status,
        }));
    }

    let event_type = envelope
        .event_type
        .or(envelope.type_)
        .unwrap_or_else(|| "<missing>".to_string());
    Ok(WebhookEvent::Unknown { event_type })
}

/// Map the provider's status vocabulary onto the internal terminal set.
/// Non-terminal statuses (queued, sending, ...) map to `None` and are
/// ignored by the reconciler.
pub fn map_delivery_status(provider_status: &str) -> Option<DeliveryState> {
    match provider_status {
        "delivered" => Some(DeliveryState::Delivered),
        "failed" | "undelivered" | "delivery_failed" | "rejected" | "expired" => {
            Some(DeliveryState::Failed)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_received() {
        let body = serde_json::json!({
            "event_type": "message.received",
            "payload": {
                "id": "prov-123",
                "from": {"phone_number": "+15552223333"},
                "to": [{"phone_number": "+15550001111"}],
                "text": "Hello",
                "media": [{"url": "https://cdn.example/pic.jpg"}]
            }
        });
        let event = parse_webhook(body.to_string().as_bytes()).unwrap();
        match event {
            WebhookEvent::MessageReceived(sms) => {
                assert_eq!(sms.provider_message_id.as_deref(), Some("prov-123"));
                assert_eq!(sms.from, "+15552223333");
                assert_eq!(sms.to, vec!["+15550001111"]);
                assert_eq!(sms.text, "Hello");
                assert_eq!(sms.media, vec!["https://cdn.example/pic.jpg"]);
            }
            other => panic!("expected MessageReceived, got {other:?}"),
        }
    }

    #[test]
    fn parses_delivery_receipt() {
        let body = serde_json::json!({
            "type": "message.delivery.updated",
            "data": {"payload": [{"id": "prov-123", "status": "delivered"}]}
        });
        let event = parse_webhook(body.to_string().as_bytes()).unwrap();
        match event {
            WebhookEvent::DeliveryReceipt(receipt) => {
                assert_eq!(receipt.provider_message_id, "prov-123");
                assert_eq!(receipt.status, "delivered");
            }
            other => panic!("expected DeliveryReceipt, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_event_type_is_unknown_not_error() {
        let body = serde_json::json!({"event_type": "message.queued", "payload": {}});
        let event = parse_webhook(body.to_string().as_bytes()).unwrap();
        assert!(matches!(
            event,
            WebhookEvent::Unknown { ref event_type } if event_type == "message.queued"
        ));
    }

    #[test]
    fn extra_unrecognized_fields_are_ignored() {
        let body = serde_json::json!({
            "event_type": "message.received",
            "occurred_at": "2026-01-01T00:00:00Z",
            "meta": {"attempt": 2},
            "payload": {
                "id": "prov-1",
                "from": {"phone_number": "+15552223333", "carrier": "ACME"},
                "to": [{"phone_number": "+15550001111"}],
                "text": "hi",
                "direction": "inbound"
            }
        });
        assert!(matches!(
            parse_webhook(body.to_string().as_bytes()).unwrap(),
            WebhookEvent::MessageReceived(_)
        ));
    }

    #[test]
    fn non_json_body_is_a_validation_error() {
        let err = parse_webhook(b"not json").unwrap_err();
        assert!(matches!(err, SteepleError::Validation(_)));
    }

    #[test]
    fn message_received_without_sender_is_a_validation_error() {
        let body = serde_json::json!({
            "event_type": "message.received",
            "payload": {"to": [{"phone_number": "+15550001111"}], "text": "hi"}
        });
        let err = parse_webhook(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, SteepleError::Validation(_)));
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let body = serde_json::json!({
            "event_type": "message.received",
            "payload": {
                "id": "prov-1",
                "from": {"phone_number": "+15552223333"},
                "to": [{"phone_number": "+15550001111"}],
                "media": [{"url": "https://cdn.example/pic.jpg"}]
            }
        });
        match parse_webhook(body.to_string().as_bytes()).unwrap() {
            WebhookEvent::MessageReceived(sms) => {
                assert_eq!(sms.text, "");
                assert_eq!(sms.media.len(), 1);
            }
            other => panic!("expected MessageReceived, got {other:?}"),
        }
    }

    #[test]
    fn status_vocabulary_maps_to_terminal_set() {
        assert_eq!(map_delivery_status("delivered"), Some(DeliveryState::Delivered));
        assert_eq!(map_delivery_status("failed"), Some(DeliveryState::Failed));
        assert_eq!(map_delivery_status("undelivered"), Some(DeliveryState::Failed));
        assert_eq!(map_delivery_status("queued"), None);
        assert_eq!(map_delivery_status("sending"), None);
    }
}
