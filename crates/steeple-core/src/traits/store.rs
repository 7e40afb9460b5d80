// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant store collaborator: per-tenant conversation/message persistence.

use async_trait::async_trait;

use crate::error::SteepleError;
use crate::types::{Conversation, ConversationMessage, DeliveryState, Member};

/// A handle to one tenant's isolated data store.
///
/// Membership lookups never cross tenant boundaries; a handle must never
/// be used as the write target for a different tenant.
#[async_trait]
pub trait TenantStore: Send + Sync + 'static {
    /// Look up a member by the deterministic search hash of their phone.
    async fn find_member_by_phone_hash(
        &self,
        phone_hash: &str,
    ) -> Result<Option<Member>, SteepleError>;

    /// Insert a member row. Membership data enters through external
    /// surfaces (admin, import); this exists for those and for tests.
    async fn insert_member(&self, member: &Member) -> Result<(), SteepleError>;

    /// Return the member's open conversation, creating one if none exists.
    async fn find_or_create_conversation(
        &self,
        member_id: &str,
    ) -> Result<Conversation, SteepleError>;

    /// Append a message to a conversation.
    async fn insert_message(&self, message: &ConversationMessage)
        -> Result<(), SteepleError>;

    /// Unique lookup by provider message id (the inbound idempotency key).
    async fn find_message_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<ConversationMessage>, SteepleError>;

    /// Set the delivery status of the message with the given provider id.
    /// Returns `false` if no such message exists in this store.
    async fn mark_delivery(
        &self,
        provider_message_id: &str,
        state: DeliveryState,
    ) -> Result<bool, SteepleError>;

    /// Messages of one conversation in chronological order.
    async fn list_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationMessage>, SteepleError>;
}
