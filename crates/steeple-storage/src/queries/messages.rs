// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message rows in a tenant store.

use rusqlite::{params, OptionalExtension};

use steeple_core::SteepleError;

use crate::database::Database;
use crate::models::{ConversationMessage, DeliveryState};
use crate::queries::{now_rfc3339, parse_enum};

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<ConversationMessage, rusqlite::Error> {
    let delivery: Option<String> = row.get(6)?;
    Ok(ConversationMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        direction: parse_enum(2, row.get::<_, String>(2)?)?,
        content: row.get(3)?,
        media_refs: row.get(4)?,
        provider_message_id: row.get(5)?,
        delivery_status: delivery.map(|s| parse_enum(6, s)).transpose()?,
        created_at: row.get(7)?,
    })
}

const SELECT_COLUMNS: &str = "id, conversation_id, direction, content, media_refs,
     provider_message_id, delivery_status, created_at";

/// Append a message and bump its conversation's `updated_at`, atomically.
pub async fn insert_message(
    db: &Database,
    message: &ConversationMessage,
) -> Result<(), SteepleError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (id, conversation_id, direction, content,
                     media_refs, provider_message_id, delivery_status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    message.id,
                    message.conversation_id,
                    message.direction.to_string(),
                    message.content,
                    message.media_refs,
                    message.provider_message_id,
                    message.delivery_status.map(|s| s.to_string()),
                    message.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
                params![now_rfc3339(), message.conversation_id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Unique lookup by provider message id (the inbound idempotency key).
pub async fn find_by_provider_id(
    db: &Database,
    provider_message_id: &str,
) -> Result<Option<ConversationMessage>, SteepleError> {
    let provider_message_id = provider_message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM messages WHERE provider_message_id = ?1"
                ),
                params![provider_message_id],
                row_to_message,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages of one conversation in chronological order.
pub async fn list_for_conversation(
    db: &Database,
    conversation_id: &str,
) -> Result<Vec<ConversationMessage>, SteepleError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![conversation_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the delivery status of the message with the given provider id.
/// Returns whether a row was updated (false means this store does not
/// hold the message).
pub async fn mark_delivery(
    db: &Database,
    provider_message_id: &str,
    state: DeliveryState,
) -> Result<bool, SteepleError> {
    let provider_message_id = provider_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE messages SET delivery_status = ?1
                 WHERE provider_message_id = ?2",
                params![state.to_string(), provider_message_id],
            )?;
            Ok(updated > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SchemaKind;
    use crate::models::{Direction, Member};
    use crate::queries::conversations::find_or_create_open;
    use crate::queries::members::insert_member;
    use tempfile::tempdir;

    async fn setup() -> (Database, String, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tenant.db");
        let db = Database::open(path.to_str().unwrap(), SchemaKind::Tenant)
            .await
            .unwrap();
        let member = Member {
            id: "m1".to_string(),
            display_name: "Pat Example".to_string(),
            phone_hash: "abc123".to_string(),
            phone: "+15552223333".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        insert_member(&db, &member).await.unwrap();
        let conversation = find_or_create_open(&db, "m1").await.unwrap();
        (db, conversation.id, dir)
    }

    fn make_msg(id: &str, conversation_id: &str, provider_id: Option<&str>) -> ConversationMessage {
        ConversationMessage {
            id: id.to_string(),
            conversation_id: conversation_id.to_string(),
            direction: Direction::Inbound,
            content: "hello".to_string(),
            media_refs: None,
            provider_message_id: provider_id.map(str::to_string),
            delivery_status: None,
            created_at: "2026-01-01T00:00:01.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_list_in_order() {
        let (db, cid, _dir) = setup().await;
        for i in 0..3 {
            let mut msg = make_msg(&format!("msg-{i}"), &cid, None);
            msg.created_at = format!("2026-01-01T00:00:0{i}.000Z");
            insert_message(&db, &msg).await.unwrap();
        }
        let messages = list_for_conversation(&db, &cid).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].id, "msg-0");
        assert_eq!(messages[2].id, "msg-2");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn provider_id_is_unique_when_present() {
        let (db, cid, _dir) = setup().await;
        insert_message(&db, &make_msg("msg-1", &cid, Some("prov-1")))
            .await
            .unwrap();
        let dup = insert_message(&db, &make_msg("msg-2", &cid, Some("prov-1"))).await;
        assert!(dup.is_err());

        // Multiple NULL provider ids are allowed.
        insert_message(&db, &make_msg("msg-3", &cid, None)).await.unwrap();
        insert_message(&db, &make_msg("msg-4", &cid, None)).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_by_provider_id_round_trips() {
        let (db, cid, _dir) = setup().await;
        insert_message(&db, &make_msg("msg-1", &cid, Some("prov-1")))
            .await
            .unwrap();
        let found = find_by_provider_id(&db, "prov-1").await.unwrap().unwrap();
        assert_eq!(found.id, "msg-1");
        assert!(find_by_provider_id(&db, "prov-2").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_delivery_reports_whether_a_row_matched() {
        let (db, cid, _dir) = setup().await;
        let mut msg = make_msg("msg-1", &cid, Some("prov-1"));
        msg.direction = Direction::Outbound;
        msg.delivery_status = Some(DeliveryState::Pending);
        insert_message(&db, &msg).await.unwrap();

        assert!(mark_delivery(&db, "prov-1", DeliveryState::Delivered)
            .await
            .unwrap());
        let found = find_by_provider_id(&db, "prov-1").await.unwrap().unwrap();
        assert_eq!(found.delivery_status, Some(DeliveryState::Delivered));

        assert!(!mark_delivery(&db, "prov-9", DeliveryState::Failed)
            .await
            .unwrap());
        db.close().await.unwrap();
    }
}
