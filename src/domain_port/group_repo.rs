use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait GroupRepo: Send + Sync {
    async fn group_of_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
    ) -> Result<Option<GroupId>, RelationError>;

    /// Locks the group row until the transaction ends; membership changes of the
    /// group serialize on it.
    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<Option<GroupRecord>, RelationError>;

    /// Order by (joined_at ASC, student_id ASC)
    async fn list_members_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<Vec<GroupMember>, RelationError>;

    async fn insert_group_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group: &GroupRecord,
    ) -> Result<(), RelationError>;

    /// Fails with `AlreadyInGroup` when the student already has a membership row.
    async fn insert_member_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        member: &GroupMember,
    ) -> Result<(), RelationError>;

    async fn delete_member_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        student: StudentId,
    ) -> Result<(), RelationError>;

    async fn delete_group_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<(), RelationError>;

    async fn set_locked_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        is_locked: bool,
    ) -> Result<(), RelationError>;

    async fn update_project_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        project_name: &str,
        description: Option<&str>,
    ) -> Result<(), RelationError>;

    async fn set_visibility_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        student: StudentId,
        show_group_on_profile: bool,
    ) -> Result<(), RelationError>;
}
