use crate::application_port::RelationError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait DiscoveryService: Send + Sync {
    /// Active students in matching semesters, viewer excluded, ordered by name.
    async fn discover(
        &self,
        viewer: StudentId,
        availability: Option<Availability>,
        page_size: PageSize,
        after: Option<StudentCursor>,
    ) -> Result<Vec<StudentSummary>, RelationError>;
}
