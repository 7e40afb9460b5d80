// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Member rows in a tenant store.

use rusqlite::{params, OptionalExtension};

use steeple_core::SteepleError;

use crate::database::Database;
use crate::models::Member;

fn row_to_member(row: &rusqlite::Row<'_>) -> Result<Member, rusqlite::Error> {
    Ok(Member {
        id: row.get(0)?,
        display_name: row.get(1)?,
        phone_hash: row.get(2)?,
        phone: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Insert a new member.
pub async fn insert_member(db: &Database, member: &Member) -> Result<(), SteepleError> {
    let member = member.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO members (id, display_name, phone_hash, phone, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    member.id,
                    member.display_name,
                    member.phone_hash,
                    member.phone,
                    member.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a member by the deterministic search hash of their phone number.
pub async fn find_by_phone_hash(
    db: &Database,
    phone_hash: &str,
) -> Result<Option<Member>, SteepleError> {
    let phone_hash = phone_hash.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, display_name, phone_hash, phone, created_at
                 FROM members WHERE phone_hash = ?1",
                params![phone_hash],
                row_to_member,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
