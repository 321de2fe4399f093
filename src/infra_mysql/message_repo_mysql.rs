use super::util::{downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::Row;

#[derive(Debug, Default)]
pub struct MySqlMessageRepo;

impl MySqlMessageRepo {
    pub fn new() -> Self {
        MySqlMessageRepo
    }

    fn row_to_message(r: &MySqlRow) -> Result<MessageRecord, sqlx::Error> {
        Ok(MessageRecord {
            message_id: r.try_get("message_id")?,
            conversation_id: r.try_get("conversation_id")?,
            message_offset: r.try_get("message_offset")?,
            sender: r.try_get("sender")?,
            content: r.try_get("content")?,
            created_at: r.try_get("created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl MessageRepo for MySqlMessageRepo {
    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        message_id: MessageId,
    ) -> Result<Option<MessageRecord>, ChatError> {
        let tx = downcast(tx);

        let row = sqlx::query(
            r#"
SELECT message_id, conversation_id, message_offset, sender, content, created_at
FROM message
WHERE message_id = ?
"#,
        )
        .bind(message_id)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| ChatError::Store(format!("query message: {e}")))?;

        row.as_ref()
            .map(Self::row_to_message)
            .transpose()
            .map_err(|e| ChatError::Store(format!("decode message: {e}")))
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        message: &MessageRecord,
    ) -> Result<(), ChatError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO message (message_id, conversation_id, message_offset, sender, content, created_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(message.message_id)
        .bind(message.conversation_id)
        .bind(message.message_offset)
        .bind(message.sender)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                ChatError::MessageIdTaken
            } else {
                ChatError::Store(format!("insert message: {e}"))
            }
        })?;

        Ok(())
    }

    async fn list_before_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
        page_size: PageSize,
        before: Option<OffsetCursor>,
    ) -> Result<Vec<MessageRecord>, ChatError> {
        let tx = downcast(tx);

        // no cursor: start past the newest offset
        let before = before.map(|c| c.offset.0).unwrap_or(u64::MAX);
        let rows = sqlx::query(
            r#"
SELECT message_id, conversation_id, message_offset, sender, content, created_at
FROM message
WHERE conversation_id = ? AND message_offset < ?
ORDER BY message_offset DESC
LIMIT ?
"#,
        )
        .bind(conversation_id)
        .bind(before)
        .bind(page_size.limit() as i64)
        .fetch_all(tx.conn())
        .await
        .map_err(|e| ChatError::Store(format!("query messages: {e}")))?;

        rows.iter()
            .map(Self::row_to_message)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ChatError::Store(format!("decode message: {e}")))
    }
}
