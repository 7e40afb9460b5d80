// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One tenant's isolated SQLite store.

use async_trait::async_trait;

use steeple_core::types::{Conversation, ConversationMessage, DeliveryState, Member};
use steeple_core::{SteepleError, TenantStore};

use crate::database::{Database, SchemaKind};
use crate::queries;

/// SQLite-backed implementation of [`TenantStore`].
///
/// Each tenant has its own database file; a `TenantDb` must never be
/// used as the write target for a different tenant.
pub struct TenantDb {
    tenant_id: String,
    db: Database,
}

impl TenantDb {
    /// Open (creating if necessary) the store for `tenant_id` at `path`.
    pub async fn open(tenant_id: &str, path: &str) -> Result<Self, SteepleError> {
        let db = Database::open(path, SchemaKind::Tenant).await?;
        Ok(Self {
            tenant_id: tenant_id.to_string(),
            db,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn close(&self) -> Result<(), SteepleError> {
        self.db.close().await
    }

    /// Test and diagnostics helper.
    pub async fn count_conversations(&self) -> Result<i64, SteepleError> {
        queries::conversations::count_conversations(&self.db).await
    }
}

#[async_trait]
impl TenantStore for TenantDb {
    async fn find_member_by_phone_hash(
        &self,
        phone_hash: &str,
    ) -> Result<Option<Member>, SteepleError> {
        queries::members::find_by_phone_hash(&self.db, phone_hash).await
    }

    async fn insert_member(&self, member: &Member) -> Result<(), SteepleError> {
        queries::members::insert_member(&self.db, member).await
    }

    async fn find_or_create_conversation(
        &self,
        member_id: &str,
    ) -> Result<Conversation, SteepleError> {
        queries::conversations::find_or_create_open(&self.db, member_id).await
    }

    async fn insert_message(
        &self,
        message: &ConversationMessage,
    ) -> Result<(), SteepleError> {
        queries::messages::insert_message(&self.db, message).await
    }

    async fn find_message_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<ConversationMessage>, SteepleError> {
        queries::messages::find_by_provider_id(&self.db, provider_message_id).await
    }

    async fn mark_delivery(
        &self,
        provider_message_id: &str,
        state: DeliveryState,
    ) -> Result<bool, SteepleError> {
        queries::messages::mark_delivery(&self.db, provider_message_id, state).await
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationMessage>, SteepleError> {
        queries::messages::list_for_conversation(&self.db, conversation_id).await
    }
}
