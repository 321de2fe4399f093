use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::StorageTx;

/// Decides whether two students may exchange messages.
///
/// Read-only and never cached: request status and group membership can change between
/// calls, so every caller gets a fresh evaluation.
#[async_trait::async_trait]
pub trait PermissionOracle: Send + Sync {
    async fn can_message(&self, a: StudentId, b: StudentId) -> Result<bool, RelationError>;
    async fn can_message_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: StudentId,
        b: StudentId,
    ) -> Result<bool, RelationError>;
}
