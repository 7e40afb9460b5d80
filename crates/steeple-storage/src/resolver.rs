// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant resolution: provider phone number -> tenant -> isolated store.
//!
//! Handles are cached per process so each tenant database is opened once
//! and keeps a single background writer. The cache key is the tenant id;
//! a cached handle is only ever returned for its own tenant.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use steeple_core::{SteepleError, Tenant, TenantId, TenantRegistry};

use crate::registry::RegistryStore;
use crate::tenant::TenantDb;

/// A resolved tenant plus the handle to its isolated store.
#[derive(Clone)]
pub struct TenantHandle {
    pub tenant: Tenant,
    pub store: Arc<TenantDb>,
}

impl TenantHandle {
    pub fn tenant_id(&self) -> &str {
        &self.tenant.id
    }
}

/// Maps phone numbers to tenants and hands out store handles.
pub struct TenantResolver {
    registry: Arc<RegistryStore>,
    tenant_dir: PathBuf,
    handles: Mutex<HashMap<String, Arc<TenantDb>>>,
}

impl TenantResolver {
    /// `tenant_dir` is where per-tenant database files live
    /// (`<tenant_dir>/<tenant_id>.db`).
    pub fn new(registry: Arc<RegistryStore>, tenant_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            tenant_dir: tenant_dir.into(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the tenant owning `phone`. A miss is not an error: it
    /// signals "no tenant owns this number" and the caller acknowledges
    /// the webhook without further processing.
    pub async fn resolve_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<TenantHandle>, SteepleError> {
        let Some(tenant) = self.registry.find_tenant_by_phone(phone).await? else {
            debug!(phone, "no tenant owns this number");
            return Ok(None);
        };
        let store = self.open_handle(&tenant.id).await?;
        Ok(Some(TenantHandle { tenant, store }))
    }

    /// All tenant ids, for the delivery reconciler's fallback scan.
    pub async fn enumerate_tenants(&self) -> Result<Vec<TenantId>, SteepleError> {
        self.registry.list_tenant_ids().await
    }

    /// Open (or return the cached) store handle for one tenant.
    pub async fn open_handle(&self, tenant_id: &str) -> Result<Arc<TenantDb>, SteepleError> {
        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(tenant_id) {
            return Ok(Arc::clone(handle));
        }
        let path = self.tenant_dir.join(format!("{tenant_id}.db"));
        let db = TenantDb::open(tenant_id, &path.to_string_lossy()).await?;
        let handle = Arc::new(db);
        handles.insert(tenant_id.to_string(), Arc::clone(&handle));
        debug!(tenant_id, "tenant store opened");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup() -> (Arc<RegistryStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let registry_path = dir.path().join("registry.db");
        let registry = Arc::new(
            RegistryStore::open(registry_path.to_str().unwrap())
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
        (registry, dir)
    }

    #[tokio::test]
    async fn resolves_known_number_to_handle() {
        let (registry, dir) = setup().await;
        let resolver = TenantResolver::new(registry, dir.path());

        let handle = resolver
            .resolve_by_phone("+15550001111")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(handle.tenant_id(), "t1");
        assert_eq!(handle.store.tenant_id(), "t1");
    }

    #[tokio::test]
    async fn unknown_number_resolves_to_none() {
        let (registry, dir) = setup().await;
        let resolver = TenantResolver::new(registry, dir.path());
        assert!(resolver
            .resolve_by_phone("+15559999999")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn handles_are_cached_per_tenant() {
        let (registry, dir) = setup().await;
        let resolver = TenantResolver::new(registry, dir.path());

        let first = resolver.open_handle("t1").await.unwrap();
        let second = resolver.open_handle("t1").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
