use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealDiscoveryService {
    student_repo: Arc<dyn StudentRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealDiscoveryService {
    pub fn new(student_repo: Arc<dyn StudentRepo>, tx_manager: Arc<dyn TxManager>) -> Self {
        RealDiscoveryService {
            student_repo,
            tx_manager,
        }
    }
}

#[async_trait::async_trait]
impl DiscoveryService for RealDiscoveryService {
    async fn discover(
        &self,
        viewer: StudentId,
        availability: Option<Availability>,
        page_size: PageSize,
        after: Option<StudentCursor>,
    ) -> Result<Vec<StudentSummary>, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let students = self
            .student_repo
            .list_matchable_in_tx(&mut *tx, viewer, availability, page_size, after)
            .await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(students.iter().map(StudentSummary::from).collect())
    }
}
