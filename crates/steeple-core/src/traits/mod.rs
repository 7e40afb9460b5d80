// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions at the seams of the gateway.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility so
//! the composition root can inject real implementations in production and
//! mocks in tests.

pub mod notify;
pub mod registry;
pub mod send;
pub mod store;

// Re-export all traits at the traits module level for convenience.
pub use notify::NotificationSink;
pub use registry::TenantRegistry;
pub use send::SendApi;
pub use store::TenantStore;
