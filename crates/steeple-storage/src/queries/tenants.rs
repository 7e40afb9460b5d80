// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant rows in the central registry store.

use rusqlite::{params, OptionalExtension};

use steeple_core::SteepleError;

use crate::database::Database;
use crate::models::Tenant;

fn row_to_tenant(row: &rusqlite::Row<'_>) -> Result<Tenant, rusqlite::Error> {
    Ok(Tenant {
        id: row.get(0)?,
        name: row.get(1)?,
        provider_phone: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Insert a new tenant. Fails if the provider phone is already claimed.
pub async fn create_tenant(db: &Database, tenant: &Tenant) -> Result<(), SteepleError> {
    let tenant = tenant.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tenants (id, name, provider_phone, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![tenant.id, tenant.name, tenant.provider_phone, tenant.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find the tenant that owns the given provider phone number.
pub async fn find_by_phone(
    db: &Database,
    phone: &str,
) -> Result<Option<Tenant>, SteepleError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, provider_phone, created_at
                 FROM tenants WHERE provider_phone = ?1",
                params![phone],
                row_to_tenant,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a tenant by id.
pub async fn get_tenant(db: &Database, id: &str) -> Result<Option<Tenant>, SteepleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, provider_phone, created_at
                 FROM tenants WHERE id = ?1",
                params![id],
                row_to_tenant,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All tenant ids, oldest first. Finite; used by the reconciler scan.
pub async fn list_tenant_ids(db: &Database) -> Result<Vec<String>, SteepleError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id FROM tenants ORDER BY created_at ASC")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            Ok(ids)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
