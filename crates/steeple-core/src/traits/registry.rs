// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry lookup collaborator: maps provider phone numbers to tenants.

use async_trait::async_trait;

use crate::error::SteepleError;
use crate::types::{Tenant, TenantId};

/// Lookup into the central, cross-tenant registry store.
///
/// A lookup miss is not an error: it signals "no tenant owns this number"
/// and callers acknowledge the webhook without further processing.
#[async_trait]
pub trait TenantRegistry: Send + Sync + 'static {
    /// Find the tenant that owns the given provider phone number.
    async fn find_tenant_by_phone(&self, phone: &str)
        -> Result<Option<Tenant>, SteepleError>;

    /// List all tenant ids. Finite; used only by the delivery
    /// reconciler's fallback scan.
    async fn list_tenant_ids(&self) -> Result<Vec<TenantId>, SteepleError>;
}
