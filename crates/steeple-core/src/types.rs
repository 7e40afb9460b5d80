// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Steeple workspace.
//!
//! The canonical entity types live here so storage, messaging, and
//! gateway crates can exchange them across trait boundaries without
//! depending on each other.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a tenant (one congregation/organization).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tenant row in the central registry store.
///
/// Invariant: at most one tenant may claim a given provider phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// The provider-assigned phone number this tenant owns (E.164).
    pub provider_phone: String,
    pub created_at: String,
}

/// A member row in a tenant store.
///
/// `phone_hash` is the deterministic search hash of the normalized phone
/// number; inbound sender matching goes through it, never the raw number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub display_name: String,
    pub phone_hash: String,
    pub phone: String,
    pub created_at: String,
}

/// Conversation lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Open,
    Closed,
    Archived,
}

/// A conversation between a tenant and exactly one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub member_id: String,
    pub state: ConversationState,
    pub created_at: String,
    pub updated_at: String,
}

/// Message direction within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Terminal delivery state of an outbound message, once known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    Pending,
    Delivered,
    Failed,
}

/// A single message within a conversation.
///
/// `provider_message_id` is the idempotency key for inbound processing:
/// a webhook carrying an already-seen id must be a no-op. Unique within
/// a tenant store when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub conversation_id: String,
    pub direction: Direction,
    pub content: String,
    /// JSON array of media URLs, when the message carried media.
    pub media_refs: Option<String>,
    pub provider_message_id: Option<String>,
    pub delivery_status: Option<DeliveryState>,
    pub created_at: String,
}

/// Category of a dead letter entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum DeadLetterCategory {
    #[strum(serialize = "send-failure")]
    #[serde(rename = "send-failure")]
    SendFailure,
    #[strum(serialize = "inbound-processing-failure")]
    #[serde(rename = "inbound-processing-failure")]
    InboundProcessingFailure,
}

/// Lifecycle status of a dead letter entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeadLetterStatus {
    Pending,
    Resolved,
    Dead,
}

/// Durable record of an operation that failed beyond automatic recovery.
///
/// Mutated only by operator-triggered replay or retry bookkeeping; deleted
/// only by explicit retention cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub id: String,
    pub category: DeadLetterCategory,
    /// Snapshot of the original operation arguments, as JSON.
    pub payload: String,
    pub error: String,
    pub retry_count: u32,
    pub status: DeadLetterStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Arguments for one provider send call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    /// The tenant's provider-assigned number.
    pub from: String,
    pub to: String,
    pub body: String,
    #[serde(default)]
    pub media: Vec<String>,
}

/// What the provider returns for an accepted send.
#[derive(Debug, Clone, PartialEq)]
pub struct SendReceipt {
    pub provider_message_id: String,
}
