// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dead letter rows in the registry store.
//!
//! Entries are created by the outbound send pipeline or the inbound
//! processor on unrecoverable failure, mutated only by operator replay
//! or retry bookkeeping, and deleted only by the retention purge.

use rusqlite::{params, OptionalExtension};

use steeple_core::SteepleError;

use crate::database::Database;
use crate::models::{DeadLetterEntry, DeadLetterStatus};
use crate::queries::{now_rfc3339, parse_enum};

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<DeadLetterEntry, rusqlite::Error> {
    Ok(DeadLetterEntry {
        id: row.get(0)?,
        category: parse_enum(1, row.get::<_, String>(1)?)?,
        payload: row.get(2)?,
        error: row.get(3)?,
        retry_count: row.get(4)?,
        status: parse_enum(5, row.get::<_, String>(5)?)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const SELECT_COLUMNS: &str =
    "id, category, payload, error, retry_count, status, created_at, updated_at";

/// Insert a new dead letter entry.
pub async fn insert_entry(db: &Database, entry: &DeadLetterEntry) -> Result<(), SteepleError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO dead_letters
                     (id, category, payload, error, retry_count, status,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.id,
                    entry.category.to_string(),
                    entry.payload,
                    entry.error,
                    entry.retry_count,
                    entry.status.to_string(),
                    entry.created_at,
                    entry.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an entry by id.
pub async fn get_entry(
    db: &Database,
    id: &str,
) -> Result<Option<DeadLetterEntry>, SteepleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM dead_letters WHERE id = ?1"),
                params![id],
                row_to_entry,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Entries with the given status, oldest first.
pub async fn list_by_status(
    db: &Database,
    status: DeadLetterStatus,
) -> Result<Vec<DeadLetterEntry>, SteepleError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM dead_letters
                 WHERE status = ?1 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(params![status.to_string()], row_to_entry)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move an entry to a new lifecycle status.
pub async fn set_status(
    db: &Database,
    id: &str,
    status: DeadLetterStatus,
) -> Result<(), SteepleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE dead_letters SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.to_string(), now_rfc3339(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Bump the retry counter after an operator-triggered replay attempt.
pub async fn record_replay_attempt(db: &Database, id: &str) -> Result<(), SteepleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE dead_letters
                 SET retry_count = retry_count + 1, updated_at = ?1
                 WHERE id = ?2",
                params![now_rfc3339(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Retention cleanup: delete resolved entries older than `cutoff`
/// (RFC 3339). Returns the number of rows removed. The only code path
/// that ever deletes a dead letter.
pub async fn purge_resolved_before(
    db: &Database,
    cutoff: &str,
) -> Result<usize, SteepleError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM dead_letters
                 WHERE status = 'resolved' AND updated_at < ?1",
                params![cutoff],
            )?;
            Ok(deleted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
