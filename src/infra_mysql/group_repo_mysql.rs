use super::util::{downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::Row;

#[derive(Debug, Default)]
pub struct MySqlGroupRepo;

impl MySqlGroupRepo {
    pub fn new() -> Self {
        MySqlGroupRepo
    }

    fn row_to_group(r: &MySqlRow) -> Result<GroupRecord, sqlx::Error> {
        Ok(GroupRecord {
            group_id: r.try_get("group_id")?,
            project_name: r.try_get("project_name")?,
            description: r.try_get("description")?,
            is_locked: r.try_get("is_locked")?,
            created_at: r.try_get("created_at")?,
        })
    }

    fn row_to_member(r: &MySqlRow) -> Result<GroupMember, sqlx::Error> {
        Ok(GroupMember {
            group_id: r.try_get("group_id")?,
            student_id: r.try_get("student_id")?,
            show_group_on_profile: r.try_get("show_group_on_profile")?,
            joined_at: r.try_get("joined_at")?,
        })
    }
}

#[async_trait::async_trait]
impl GroupRepo for MySqlGroupRepo {
    async fn group_of_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
    ) -> Result<Option<GroupId>, RelationError> {
        let tx = downcast(tx);

        let group_id: Option<GroupId> =
            sqlx::query_scalar("SELECT group_id FROM fyp_group_member WHERE student_id = ?")
                .bind(student)
                .fetch_optional(tx.conn())
                .await
                .map_err(|e| RelationError::Store(format!("query group of student: {e}")))?;

        Ok(group_id)
    }

    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<Option<GroupRecord>, RelationError> {
        let tx = downcast(tx);

        let row = sqlx::query(
            r#"
SELECT group_id, project_name, description, is_locked, created_at
FROM fyp_group
WHERE group_id = ?
FOR UPDATE
"#,
        )
        .bind(group_id)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("query group: {e}")))?;

        row.as_ref()
            .map(Self::row_to_group)
            .transpose()
            .map_err(|e| RelationError::Store(format!("decode group: {e}")))
    }

    async fn list_members_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<Vec<GroupMember>, RelationError> {
        let tx = downcast(tx);

        let rows = sqlx::query(
            r#"
SELECT group_id, student_id, show_group_on_profile, joined_at
FROM fyp_group_member
WHERE group_id = ?
ORDER BY joined_at ASC, student_id ASC
"#,
        )
        .bind(group_id)
        .fetch_all(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("query group members: {e}")))?;

        rows.iter()
            .map(Self::row_to_member)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RelationError::Store(format!("decode group member: {e}")))
    }

    async fn insert_group_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group: &GroupRecord,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO fyp_group (group_id, project_name, description, is_locked, created_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(group.group_id)
        .bind(group.project_name.as_deref())
        .bind(group.description.as_deref())
        .bind(group.is_locked)
        .bind(group.created_at)
        .execute(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("insert group: {e}")))?;

        Ok(())
    }

    async fn insert_member_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        member: &GroupMember,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO fyp_group_member (group_id, student_id, show_group_on_profile, joined_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(member.group_id)
        .bind(member.student_id)
        .bind(member.show_group_on_profile)
        .bind(member.joined_at)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            // uq_member_student: a concurrent accept placed the student first
            if is_dup_key(&e) {
                RelationError::AlreadyInGroup
            } else {
                RelationError::Store(format!("insert group member: {e}"))
            }
        })?;

        Ok(())
    }

    async fn delete_member_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        student: StudentId,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        let result =
            sqlx::query("DELETE FROM fyp_group_member WHERE group_id = ? AND student_id = ?")
                .bind(group_id)
                .bind(student)
                .execute(tx.conn())
                .await
                .map_err(|e| RelationError::Store(format!("delete group member: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(RelationError::NotMember);
        }

        Ok(())
    }

    async fn delete_group_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        // members go with ON DELETE CASCADE
        sqlx::query("DELETE FROM fyp_group WHERE group_id = ?")
            .bind(group_id)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("delete group: {e}")))?;

        Ok(())
    }

    async fn set_locked_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        is_locked: bool,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        sqlx::query("UPDATE fyp_group SET is_locked = ? WHERE group_id = ?")
            .bind(is_locked)
            .bind(group_id)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("update group lock: {e}")))?;

        Ok(())
    }

    async fn update_project_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        project_name: &str,
        description: Option<&str>,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        sqlx::query("UPDATE fyp_group SET project_name = ?, description = ? WHERE group_id = ?")
            .bind(project_name)
            .bind(description)
            .bind(group_id)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("update group project: {e}")))?;

        Ok(())
    }

    async fn set_visibility_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        student: StudentId,
        show_group_on_profile: bool,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        // affected rows stay 0 when the flag already has this value, so check membership first
        let is_member: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM fyp_group_member WHERE group_id = ? AND student_id = ? FOR UPDATE",
        )
        .bind(group_id)
        .bind(student)
        .fetch_one(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("query group member: {e}")))?;
        if is_member == 0 {
            return Err(RelationError::NotMember);
        }

        sqlx::query(
            r#"
UPDATE fyp_group_member
SET show_group_on_profile = ?
WHERE group_id = ? AND student_id = ?
"#,
        )
        .bind(show_group_on_profile)
        .bind(group_id)
        .bind(student)
        .execute(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("update group visibility: {e}")))?;

        Ok(())
    }
}
