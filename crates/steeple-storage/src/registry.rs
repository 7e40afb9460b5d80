// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The central registry store: tenant directory plus dead letters.

use async_trait::async_trait;
use tracing::debug;

use steeple_core::types::{DeadLetterCategory, DeadLetterEntry, DeadLetterStatus};
use steeple_core::{SteepleError, Tenant, TenantId, TenantRegistry};

use crate::database::{Database, SchemaKind};
use crate::queries;

/// Shared, cross-tenant store mapping provider phone numbers to tenants.
pub struct RegistryStore {
    db: Database,
}

impl RegistryStore {
    /// Open (creating if necessary) the registry database at `path`.
    pub async fn open(path: &str) -> Result<Self, SteepleError> {
        let db = Database::open(path, SchemaKind::Registry).await?;
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// A dead letter handle sharing this registry's single writer.
    pub fn dead_letters(&self) -> DeadLetterStore {
        DeadLetterStore {
            db: self.db.clone(),
        }
    }

    pub async fn create_tenant(&self, tenant: &Tenant) -> Result<(), SteepleError> {
        queries::tenants::create_tenant(&self.db, tenant).await
    }

    pub async fn get_tenant(&self, id: &str) -> Result<Option<Tenant>, SteepleError> {
        queries::tenants::get_tenant(&self.db, id).await
    }

    pub async fn close(&self) -> Result<(), SteepleError> {
        self.db.close().await
    }
}

#[async_trait]
impl TenantRegistry for RegistryStore {
    async fn find_tenant_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<Tenant>, SteepleError> {
        queries::tenants::find_by_phone(&self.db, phone).await
    }

    async fn list_tenant_ids(&self) -> Result<Vec<TenantId>, SteepleError> {
        let ids = queries::tenants::list_tenant_ids(&self.db).await?;
        Ok(ids.into_iter().map(TenantId).collect())
    }
}

/// Durable capture of operations that failed beyond automatic recovery.
#[derive(Clone)]
pub struct DeadLetterStore {
    db: Database,
}

impl DeadLetterStore {
    /// Capture a failed operation. `payload` is the original-argument
    /// snapshot; `retry_count` is how many retries were consumed before
    /// giving up.
    pub async fn record(
        &self,
        category: DeadLetterCategory,
        payload: serde_json::Value,
        error: &str,
        retry_count: u32,
    ) -> Result<DeadLetterEntry, SteepleError> {
        let now = queries::now_rfc3339();
        let entry = DeadLetterEntry {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            payload: payload.to_string(),
            error: error.to_string(),
            retry_count,
            status: DeadLetterStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
        };
        queries::dead_letters::insert_entry(&self.db, &entry).await?;
        debug!(id = %entry.id, %category, "dead letter recorded");
        Ok(entry)
    }

    pub async fn get(&self, id: &str) -> Result<Option<DeadLetterEntry>, SteepleError> {
        queries::dead_letters::get_entry(&self.db, id).await
    }

    pub async fn list_pending(&self) -> Result<Vec<DeadLetterEntry>, SteepleError> {
        queries::dead_letters::list_by_status(&self.db, DeadLetterStatus::Pending).await
    }

    pub async fn mark_resolved(&self, id: &str) -> Result<(), SteepleError> {
        queries::dead_letters::set_status(&self.db, id, DeadLetterStatus::Resolved).await
    }

    pub async fn mark_dead(&self, id: &str) -> Result<(), SteepleError> {
        queries::dead_letters::set_status(&self.db, id, DeadLetterStatus::Dead).await
    }

    pub async fn record_replay_attempt(&self, id: &str) -> Result<(), SteepleError> {
        queries::dead_letters::record_replay_attempt(&self.db, id).await
    }

    pub async fn purge_resolved_before(&self, cutoff: &str) -> Result<usize, SteepleError> {
        queries::dead_letters::purge_resolved_before(&self.db, cutoff).await
    }
}
