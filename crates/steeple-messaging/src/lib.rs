// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message pipeline of the Steeple gateway.
//!
//! Three request-scoped units of work live here: the inbound webhook
//! processor (provider -> tenant store), the outbound send pipeline
//! (application -> provider, with retry, circuit breaker, and dead
//! letter capture), and the delivery reconciler (async provider
//! receipts -> tenant stores). Shared process-wide state is limited to
//! the injected circuit breaker and the send-time route cache.

pub mod inbound;
pub mod notify;
pub mod outbound;
pub mod reconcile;

pub use inbound::{InboundOutcome, InboundProcessor};
pub use notify::{NullNotifier, WebhookNotifier};
pub use outbound::{ReplayReport, SendPipeline};
pub use reconcile::{DeliveryReconciler, ReceiptOutcome, RouteCache};

/// Current UTC time in the millisecond RFC 3339 form used by the schema.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
