use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

/// Read side of the profile module. Writes happen there; `insert_in_tx` exists for seeding.
#[async_trait::async_trait]
pub trait StudentRepo: Send + Sync {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: &Student,
    ) -> Result<(), RelationError>;
    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student_id: StudentId,
    ) -> Result<Option<Student>, RelationError>;
    async fn get_by_user_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user_id: UserId,
    ) -> Result<Option<Student>, RelationError>;

    /// Active students within `MATCHING_SEMESTERS`, order by (name ASC, student_id ASC)
    async fn list_matchable_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        exclude: StudentId,
        availability: Option<Availability>,
        page_size: PageSize,
        after: Option<StudentCursor>,
    ) -> Result<Vec<Student>, RelationError>;
}
