use super::util::{downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::Row;

#[derive(Debug, Default)]
pub struct MySqlConversationRepo;

impl MySqlConversationRepo {
    pub fn new() -> Self {
        MySqlConversationRepo
    }

    fn row_to_conversation(r: &MySqlRow) -> Result<ConversationRecord, ChatError> {
        let decode = || -> Result<ConversationRecord, sqlx::Error> {
            Ok(ConversationRecord {
                conversation_id: r.try_get("conversation_id")?,
                pair: StudentPair::new(r.try_get("student_min")?, r.try_get("student_max")?),
                last_msg_off: r.try_get("last_msg_off")?,
                last_msg_at: r.try_get("last_msg_at")?,
                created_at: r.try_get("created_at")?,
            })
        };
        decode().map_err(|e| ChatError::Store(format!("decode conversation: {e}")))
    }
}

const CONVERSATION_COLUMNS: &str =
    "conversation_id, student_min, student_max, last_msg_off, last_msg_at, created_at";

#[async_trait::async_trait]
impl ConversationRepo for MySqlConversationRepo {
    async fn get_by_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
    ) -> Result<Option<ConversationRecord>, ChatError> {
        let tx = downcast(tx);

        let sql = format!(
            r#"
SELECT {CONVERSATION_COLUMNS}
FROM conversation
WHERE student_min = ? AND student_max = ?
FOR UPDATE
"#
        );
        let row = sqlx::query(&sql)
            .bind(pair.min())
            .bind(pair.max())
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| ChatError::Store(format!("query conversation by pair: {e}")))?;

        row.as_ref().map(Self::row_to_conversation).transpose()
    }

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationRecord>, ChatError> {
        let tx = downcast(tx);

        let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversation WHERE conversation_id = ?");
        let row = sqlx::query(&sql)
            .bind(conversation_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| ChatError::Store(format!("query conversation: {e}")))?;

        row.as_ref().map(Self::row_to_conversation).transpose()
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation: &ConversationRecord,
    ) -> Result<(), ChatError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO conversation (conversation_id, student_min, student_max, last_msg_off, last_msg_at, created_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(conversation.conversation_id)
        .bind(conversation.pair.min())
        .bind(conversation.pair.max())
        .bind(conversation.last_msg_off)
        .bind(conversation.last_msg_at)
        .bind(conversation.created_at)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                ChatError::AlreadyExists
            } else {
                ChatError::Store(format!("insert conversation: {e}"))
            }
        })?;

        Ok(())
    }

    async fn advance_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
        at: DateTime<Utc>,
    ) -> Result<MessageOffset, ChatError> {
        let tx = downcast(tx);

        let result = sqlx::query(
            r#"
UPDATE conversation
SET last_msg_off = last_msg_off + 1, last_msg_at = ?
WHERE conversation_id = ?
"#,
        )
        .bind(at)
        .bind(conversation_id)
        .execute(tx.conn())
        .await
        .map_err(|e| ChatError::Store(format!("advance conversation: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(ChatError::ConversationNotFound);
        }

        // the row stays locked by the update above
        let offset: MessageOffset =
            sqlx::query_scalar("SELECT last_msg_off FROM conversation WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(tx.conn())
                .await
                .map_err(|e| ChatError::Store(format!("query conversation offset: {e}")))?;

        Ok(offset)
    }

    async fn list_for_student_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<ConversationCursor>,
    ) -> Result<Vec<ConversationRecord>, ChatError> {
        let tx = downcast(tx);
        let limit = page_size.limit() as i64;

        let query_result = if let Some(cursor) = before {
            let sql = format!(
                r#"
SELECT {CONVERSATION_COLUMNS}
FROM conversation
WHERE (student_min = ? OR student_max = ?)
  AND (COALESCE(last_msg_at, created_at) < ?
       OR (COALESCE(last_msg_at, created_at) = ? AND conversation_id < ?))
ORDER BY COALESCE(last_msg_at, created_at) DESC, conversation_id DESC
LIMIT ?
"#
            );
            sqlx::query(&sql)
                .bind(student)
                .bind(student)
                .bind(cursor.activity_at)
                .bind(cursor.activity_at)
                .bind(cursor.conversation_id)
                .bind(limit)
                .fetch_all(tx.conn())
                .await
        } else {
            let sql = format!(
                r#"
SELECT {CONVERSATION_COLUMNS}
FROM conversation
WHERE student_min = ? OR student_max = ?
ORDER BY COALESCE(last_msg_at, created_at) DESC, conversation_id DESC
LIMIT ?
"#
            );
            sqlx::query(&sql)
                .bind(student)
                .bind(student)
                .bind(limit)
                .fetch_all(tx.conn())
                .await
        };

        let rows = query_result
            .map_err(|e| ChatError::Store(format!("query conversations of student: {e}")))?;
        rows.iter().map(Self::row_to_conversation).collect()
    }
}
