use super::util::{downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::Row;

#[derive(Debug, Default)]
pub struct MySqlRequestRepo;

impl MySqlRequestRepo {
    pub fn new() -> Self {
        MySqlRequestRepo
    }

    fn row_to_request(r: &MySqlRow) -> Result<ConnectionRequest, sqlx::Error> {
        Ok(ConnectionRequest {
            request_id: r.try_get("request_id")?,
            kind: r.try_get("kind")?,
            from: r.try_get("from_student")?,
            to: r.try_get("to_student")?,
            status: r.try_get("status")?,
            reason: r.try_get("reason")?,
            created_at: r.try_get("created_at")?,
            resolved_at: r.try_get("resolved_at")?,
        })
    }

    fn rows_to_requests(rows: &[MySqlRow]) -> Result<Vec<ConnectionRequest>, RelationError> {
        rows.iter()
            .map(Self::row_to_request)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RelationError::Store(format!("decode request: {e}")))
    }

    /// `column` is either `from_student` or `to_student`.
    async fn list_newest_first(
        tx: &mut dyn StorageTx<'_>,
        column: &'static str,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError> {
        let tx = downcast(tx);
        let limit = page_size.limit() as i64;

        let result = if let Some(cursor) = before {
            let sql = format!(
                r#"
SELECT {REQUEST_COLUMNS}
FROM connection_request
WHERE {column} = ?
  AND (created_at < ? OR (created_at = ? AND request_id < ?))
ORDER BY created_at DESC, request_id DESC
LIMIT ?
"#
            );
            sqlx::query(&sql)
                .bind(student)
                .bind(cursor.created_at)
                .bind(cursor.created_at)
                .bind(cursor.request_id)
                .bind(limit)
                .fetch_all(tx.conn())
                .await
        } else {
            let sql = format!(
                r#"
SELECT {REQUEST_COLUMNS}
FROM connection_request
WHERE {column} = ?
ORDER BY created_at DESC, request_id DESC
LIMIT ?
"#
            );
            sqlx::query(&sql)
                .bind(student)
                .bind(limit)
                .fetch_all(tx.conn())
                .await
        };
        let rows =
            result.map_err(|e| RelationError::Store(format!("query requests by {column}: {e}")))?;

        Self::rows_to_requests(&rows)
    }
}

const REQUEST_COLUMNS: &str =
    "request_id, kind, from_student, to_student, status, reason, created_at, resolved_at";

#[async_trait::async_trait]
impl RequestRepo for MySqlRequestRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request: &ConnectionRequest,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);
        let pair = StudentPair::new(request.from, request.to);

        sqlx::query(
            r#"
INSERT INTO connection_request
    (request_id, kind, from_student, to_student, student_min, student_max, status, reason, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(request.request_id)
        .bind(request.kind)
        .bind(request.from)
        .bind(request.to)
        .bind(pair.min())
        .bind(pair.max())
        .bind(request.status)
        .bind(request.reason.as_deref())
        .bind(request.created_at)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            // uq_pending_pair
            if is_dup_key(&e) {
                RelationError::RequestExists(request.kind)
            } else {
                RelationError::Store(format!("insert request: {e}"))
            }
        })?;

        Ok(())
    }

    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request_id: RequestId,
    ) -> Result<Option<ConnectionRequest>, RelationError> {
        let tx = downcast(tx);

        let sql =
            format!("SELECT {REQUEST_COLUMNS} FROM connection_request WHERE request_id = ? FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(request_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("query request: {e}")))?;

        row.as_ref()
            .map(Self::row_to_request)
            .transpose()
            .map_err(|e| RelationError::Store(format!("decode request: {e}")))
    }

    async fn find_pending_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
        kind: RequestKind,
    ) -> Result<Option<ConnectionRequest>, RelationError> {
        let tx = downcast(tx);

        let sql = format!(
            r#"
SELECT {REQUEST_COLUMNS}
FROM connection_request
WHERE student_min = ? AND student_max = ? AND kind = ? AND status = ?
LIMIT 1
"#
        );
        let row = sqlx::query(&sql)
            .bind(pair.min())
            .bind(pair.max())
            .bind(kind)
            .bind(RequestStatus::Pending)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("query pending request: {e}")))?;

        row.as_ref()
            .map(Self::row_to_request)
            .transpose()
            .map_err(|e| RelationError::Store(format!("decode request: {e}")))
    }

    async fn accepted_exists_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
        kind: RequestKind,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx);

        let count: i64 = sqlx::query_scalar(
            r#"
SELECT COUNT(1)
FROM connection_request
WHERE student_min = ? AND student_max = ? AND kind = ? AND status = ?
"#,
        )
        .bind(pair.min())
        .bind(pair.max())
        .bind(kind)
        .bind(RequestStatus::Accepted)
        .fetch_one(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("query accepted request: {e}")))?;

        Ok(count > 0)
    }

    async fn resolve_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request_id: RequestId,
        status: RequestStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        let result = sqlx::query(
            "UPDATE connection_request SET status = ?, resolved_at = ? WHERE request_id = ?",
        )
        .bind(status)
        .bind(resolved_at)
        .bind(request_id)
        .execute(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("resolve request: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(RelationError::RequestNotFound);
        }

        Ok(())
    }

    async fn list_sent_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError> {
        Self::list_newest_first(tx, "from_student", student, page_size, before).await
    }

    async fn list_received_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError> {
        Self::list_newest_first(tx, "to_student", student, page_size, before).await
    }
}
