// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. The registry store and the per-tenant stores
//! carry separate schemas, so each has its own embedded set. Refinery
//! tracks applied migrations per database file in its
//! `refinery_schema_history` table.

use steeple_core::SteepleError;

mod registry_embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations/registry");
}

mod tenant_embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations/tenant");
}

/// Run all pending registry-store migrations against the given connection.
pub fn run_registry_migrations(
    conn: &mut rusqlite::Connection,
) -> Result<(), SteepleError> {
    registry_embedded::migrations::runner()
        .run(conn)
        .map_err(|e| SteepleError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}

/// Run all pending tenant-store migrations against the given connection.
pub fn run_tenant_migrations(conn: &mut rusqlite::Connection) -> Result<(), SteepleError> {
    tenant_embedded::migrations::runner()
        .run(conn)
        .map_err(|e| SteepleError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
