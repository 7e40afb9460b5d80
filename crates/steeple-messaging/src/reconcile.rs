// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery receipt reconciliation.
//!
//! A receipt carries only the provider message id, never a tenant key,
//! so matching it to the store holding that message is a lookup problem.
//! The send pipeline records a `provider_message_id -> tenant_id` route
//! cache entry at send time; receipts that miss the cache (process
//! restart, cache expiry, late receipts) fall back to scanning every
//! tenant store sequentially, short-circuiting on first match.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

use steeple_core::{SteepleError, TenantStore};
use steeple_provider::map_delivery_status;
use steeple_storage::TenantResolver;

/// In-memory, TTL-bounded mapping of provider message ids to tenants,
/// written by the send pipeline at send time.
pub struct RouteCache {
    entries: DashMap<String, RouteEntry>,
    ttl: Duration,
}

struct RouteEntry {
    tenant_id: String,
    inserted_at: Instant,
}

impl RouteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Remember which tenant a just-sent message belongs to.
    pub fn record(&self, provider_message_id: &str, tenant_id: &str) {
        self.entries.insert(
            provider_message_id.to_string(),
            RouteEntry {
                tenant_id: tenant_id.to_string(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Look up the tenant for a provider message id, evicting the entry
    /// if it has expired.
    pub fn lookup(&self, provider_message_id: &str) -> Option<String> {
        let expired = match self.entries.get(provider_message_id) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                return Some(entry.tenant_id.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(provider_message_id);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Terminal outcome of applying one delivery receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// Exactly one message in one tenant store was updated.
    Updated { tenant_id: String },
    /// Non-terminal provider status; nothing to do yet.
    Ignored { status: String },
    /// No tenant store holds the id: late, out-of-order, or already
    /// garbage-collected. Acknowledged and dropped.
    Dropped,
}

/// Matches asynchronous delivery receipts to tenant stores.
pub struct DeliveryReconciler {
    resolver: Arc<TenantResolver>,
    route_cache: Arc<RouteCache>,
}

impl DeliveryReconciler {
    pub fn new(resolver: Arc<TenantResolver>, route_cache: Arc<RouteCache>) -> Self {
        Self {
            resolver,
            route_cache,
        }
    }

    /// Apply one receipt. Message ids are provider-wide unique, so at
    /// most one tenant can match; the scan stops at the first hit.
    /// Per-tenant store failures are logged and the scan continues.
    pub async fn apply_receipt(
        &self,
        provider_message_id: &str,
        provider_status: &str,
    ) -> Result<ReceiptOutcome, SteepleError> {
        let Some(state) = map_delivery_status(provider_status) else {
            debug!(provider_message_id, provider_status, "non-terminal status ignored");
            steeple_metrics::record_receipt("ignored");
            return Ok(ReceiptOutcome::Ignored {
                status: provider_status.to_string(),
            });
        };

        // Fast path: the send-time route cache.
        if let Some(tenant_id) = self.route_cache.lookup(provider_message_id) {
            match self.resolver.open_handle(&tenant_id).await {
                Ok(store) => {
                    if store.mark_delivery(provider_message_id, state).await? {
                        debug!(provider_message_id, tenant_id, "receipt matched via route cache");
                        steeple_metrics::record_receipt("matched");
                        return Ok(ReceiptOutcome::Updated { tenant_id });
                    }
                    // Cache pointed somewhere without the row; fall back.
                }
                Err(err) => {
                    warn!(tenant_id, error = %err, "route cache hit but store unavailable");
                }
            }
        }

        // Fallback: scan every tenant, sequentially, first match wins.
        for tenant_id in self.resolver.enumerate_tenants().await? {
            let store = match self.resolver.open_handle(&tenant_id.0).await {
                Ok(store) => store,
                Err(err) => {
                    warn!(tenant_id = %tenant_id, error = %err, "skipping unreachable tenant store");
                    continue;
                }
            };
            match store.mark_delivery(provider_message_id, state).await {
                Ok(true) => {
                    debug!(provider_message_id, tenant_id = %tenant_id, "receipt matched via scan");
                    steeple_metrics::record_receipt("matched");
                    return Ok(ReceiptOutcome::Updated {
                        tenant_id: tenant_id.0,
                    });
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(tenant_id = %tenant_id, error = %err, "tenant lookup failed, continuing scan");
                }
            }
        }

        debug!(provider_message_id, "receipt matched no tenant store, dropping");
        steeple_metrics::record_receipt("dropped");
        Ok(ReceiptOutcome::Dropped)
    }
}
