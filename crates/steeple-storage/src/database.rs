// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes to one database file are serialized through tokio-rusqlite's
//! single background thread: the `Database` handle IS the single writer.
//! Query modules accept `&Database` and go through `connection().call()`.
//! Do NOT open additional connections to the same file for writes.

use tracing::debug;

use steeple_core::SteepleError;

use crate::migrations;

/// Per-connection PRAGMAs. WAL is persistent once set; the rest must be
/// applied on every connection.
const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;";

/// Which schema a database file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// The central cross-tenant registry (tenants, dead letters).
    Registry,
    /// One tenant's isolated store (members, conversations, messages).
    Tenant,
}

/// Map a tokio-rusqlite error into the workspace error type.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> SteepleError {
    SteepleError::Storage {
        source: Box::new(err),
    }
}

fn map_sqlite_err(err: rusqlite::Error) -> SteepleError {
    SteepleError::Storage {
        source: Box::new(err),
    }
}

/// A single-writer handle to one SQLite database file.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path`, apply PRAGMAs,
    /// and run the embedded migrations for `kind`.
    ///
    /// Migrations run on a short-lived blocking connection (refinery's
    /// native target) before the async single-writer handle is opened.
    pub async fn open(path: &str, kind: SchemaKind) -> Result<Self, SteepleError> {
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), SteepleError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(map_sqlite_err)?;
            conn.execute_batch(PRAGMAS).map_err(map_sqlite_err)?;
            match kind {
                SchemaKind::Registry => migrations::run_registry_migrations(&mut conn),
                SchemaKind::Tenant => migrations::run_tenant_migrations(&mut conn),
            }
        })
        .await
        .map_err(|e| SteepleError::Internal(format!("migration task panicked: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_sqlite_err)?;
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, ?kind, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the background writer.
    pub async fn close(&self) -> Result<(), SteepleError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
