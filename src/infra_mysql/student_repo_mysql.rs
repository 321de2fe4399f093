use super::util::{downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::Row;

#[derive(Debug, Default)]
pub struct MySqlStudentRepo;

impl MySqlStudentRepo {
    pub fn new() -> Self {
        MySqlStudentRepo
    }

    fn row_to_student(r: &MySqlRow) -> Result<Student, sqlx::Error> {
        Ok(Student {
            student_id: r.try_get("student_id")?,
            user_id: r.try_get("user_id")?,
            name: r.try_get("name")?,
            semester: r.try_get("semester")?,
            availability: r.try_get("availability")?,
            account_status: r.try_get("account_status")?,
        })
    }
}

const STUDENT_COLUMNS: &str =
    "student_id, user_id, name, semester, availability, account_status";

#[async_trait::async_trait]
impl StudentRepo for MySqlStudentRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: &Student,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO student (student_id, user_id, name, semester, availability, account_status)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(student.student_id)
        .bind(student.user_id)
        .bind(&student.name)
        .bind(student.semester)
        .bind(student.availability)
        .bind(student.account_status)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                RelationError::Store(format!("duplicate student {}", student.student_id))
            } else {
                RelationError::Store(format!("insert student: {e}"))
            }
        })?;

        Ok(())
    }

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student_id: StudentId,
    ) -> Result<Option<Student>, RelationError> {
        let tx = downcast(tx);

        let sql = format!("SELECT {STUDENT_COLUMNS} FROM student WHERE student_id = ?");
        let row = sqlx::query(&sql)
            .bind(student_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("query student: {e}")))?;

        row.as_ref()
            .map(Self::row_to_student)
            .transpose()
            .map_err(|e| RelationError::Store(format!("decode student: {e}")))
    }

    async fn get_by_user_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user_id: UserId,
    ) -> Result<Option<Student>, RelationError> {
        let tx = downcast(tx);

        let sql = format!("SELECT {STUDENT_COLUMNS} FROM student WHERE user_id = ?");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("query student by user: {e}")))?;

        row.as_ref()
            .map(Self::row_to_student)
            .transpose()
            .map_err(|e| RelationError::Store(format!("decode student: {e}")))
    }

    async fn list_matchable_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        exclude: StudentId,
        availability: Option<Availability>,
        page_size: PageSize,
        after: Option<StudentCursor>,
    ) -> Result<Vec<Student>, RelationError> {
        let tx = downcast(tx);
        let limit = page_size.limit() as i64;

        let base = format!(
            r#"
SELECT {STUDENT_COLUMNS}
FROM student
WHERE account_status = ?
  AND semester BETWEEN ? AND ?
  AND student_id <> ?
  AND (? IS NULL OR availability = ?)
"#
        );
        let query_result = if let Some(cursor) = after {
            let sql = format!(
                "{base}  AND (name > ? OR (name = ? AND student_id > ?))\nORDER BY name ASC, student_id ASC\nLIMIT ?"
            );
            sqlx::query(&sql)
                .bind(AccountStatus::Active)
                .bind(*MATCHING_SEMESTERS.start())
                .bind(*MATCHING_SEMESTERS.end())
                .bind(exclude)
                .bind(availability)
                .bind(availability)
                .bind(&cursor.name)
                .bind(&cursor.name)
                .bind(cursor.student_id)
                .bind(limit)
                .fetch_all(tx.conn())
                .await
        } else {
            let sql = format!("{base}ORDER BY name ASC, student_id ASC\nLIMIT ?");
            sqlx::query(&sql)
                .bind(AccountStatus::Active)
                .bind(*MATCHING_SEMESTERS.start())
                .bind(*MATCHING_SEMESTERS.end())
                .bind(exclude)
                .bind(availability)
                .bind(availability)
                .bind(limit)
                .fetch_all(tx.conn())
                .await
        };

        let rows =
            query_result.map_err(|e| RelationError::Store(format!("query discovery: {e}")))?;
        rows.iter()
            .map(Self::row_to_student)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RelationError::Store(format!("decode student: {e}")))
    }
}
