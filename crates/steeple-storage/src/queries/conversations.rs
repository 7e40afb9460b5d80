// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation rows in a tenant store.

use rusqlite::{params, OptionalExtension};

use steeple_core::SteepleError;

use crate::database::Database;
use crate::models::{Conversation, ConversationState};
use crate::queries::{now_rfc3339, parse_enum};

fn row_to_conversation(row: &rusqlite::Row<'_>) -> Result<Conversation, rusqlite::Error> {
    Ok(Conversation {
        id: row.get(0)?,
        member_id: row.get(1)?,
        state: parse_enum(2, row.get::<_, String>(2)?)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Return the member's open conversation, creating one if none exists.
///
/// Runs in a transaction so a concurrent first-inbound and first-outbound
/// for the same member cannot both create a conversation.
pub async fn find_or_create_open(
    db: &Database,
    member_id: &str,
) -> Result<Conversation, SteepleError> {
    let member_id = member_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let existing = tx
                .query_row(
                    "SELECT id, member_id, state, created_at, updated_at
                     FROM conversations
                     WHERE member_id = ?1 AND state = 'open'
                     ORDER BY created_at ASC LIMIT 1",
                    params![member_id],
                    row_to_conversation,
                )
                .optional()?;

            if let Some(conversation) = existing {
                tx.commit()?;
                return Ok(conversation);
            }

            let now = now_rfc3339();
            let conversation = Conversation {
                id: uuid::Uuid::new_v4().to_string(),
                member_id: member_id.clone(),
                state: ConversationState::Open,
                created_at: now.clone(),
                updated_at: now,
            };
            tx.execute(
                "INSERT INTO conversations (id, member_id, state, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    conversation.id,
                    conversation.member_id,
                    conversation.state.to_string(),
                    conversation.created_at,
                    conversation.updated_at,
                ],
            )?;
            tx.commit()?;
            Ok(conversation)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a conversation by id.
pub async fn get_conversation(
    db: &Database,
    id: &str,
) -> Result<Option<Conversation>, SteepleError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, member_id, state, created_at, updated_at
                 FROM conversations WHERE id = ?1",
                params![id],
                row_to_conversation,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of conversations in this store (test and diagnostics helper).
pub async fn count_conversations(db: &Database) -> Result<i64, SteepleError> {
    db.connection()
        .call(|conn| {
            conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
        })
        .await
        .map_err(crate::database::map_tr_err)
}
