// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Steeple messaging gateway.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed CRUD
//! operations for two schemas: the central registry store (tenants,
//! dead letters) and the isolated per-tenant stores (members,
//! conversations, messages). The rusqlite build is sqlcipher-capable,
//! so tenant stores can be encrypted at rest by deployment policy.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod registry;
pub mod resolver;
pub mod tenant;

pub use database::{Database, SchemaKind};
pub use models::*;
pub use registry::{DeadLetterStore, RegistryStore};
pub use resolver::{TenantHandle, TenantResolver};
pub use tenant::TenantDb;
