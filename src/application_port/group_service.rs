use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::StorageTx;

pub const MAX_PROJECT_NAME_LEN: usize = 200;

#[async_trait::async_trait]
pub trait GroupService: Send + Sync {
    async fn my_group(&self, student: StudentId) -> Result<Option<FypGroup>, RelationError>;
    async fn lock_group(&self, student: StudentId) -> Result<FypGroup, RelationError>;
    /// Returns `None` when the removal emptied and deleted the group.
    async fn remove_member(
        &self,
        acting: StudentId,
        target: StudentId,
    ) -> Result<Option<FypGroup>, RelationError>;
    async fn update_project(
        &self,
        student: StudentId,
        project_name: &str,
        description: Option<&str>,
    ) -> Result<FypGroup, RelationError>;
    async fn update_visibility(
        &self,
        student: StudentId,
        show_on_profile: bool,
    ) -> Result<GroupMember, RelationError>;
}

/// Group-side effects of PARTNER requests, run inside the ledger's transaction.
#[async_trait::async_trait]
pub trait GroupFormation: Send + Sync {
    /// Rejects a PARTNER request up front when accepting it could never succeed.
    async fn check_partner_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        from: StudentId,
        to: StudentId,
    ) -> Result<(), RelationError>;
    async fn merge_on_partner_accept_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: StudentId,
        b: StudentId,
    ) -> Result<GroupId, RelationError>;
}
