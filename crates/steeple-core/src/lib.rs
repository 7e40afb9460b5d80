// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Steeple messaging gateway.
//!
//! This crate provides the error taxonomy, domain types, and collaborator
//! trait definitions used throughout the Steeple workspace. Storage,
//! resilience, provider, and pipeline crates all build on what is
//! defined here.

pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{FailureClass, SteepleError};
pub use types::{TenantId, Tenant};

// Re-export all collaborator traits at crate root.
pub use traits::{NotificationSink, SendApi, TenantRegistry, TenantStore};
