use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait RequestRepo: Send + Sync {
    /// Fails with `RequestExists` when the store already holds a pending request of the
    /// same kind for the unordered pair.
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request: &ConnectionRequest,
    ) -> Result<(), RelationError>;

    /// Locks the row until the transaction ends.
    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request_id: RequestId,
    ) -> Result<Option<ConnectionRequest>, RelationError>;

    async fn find_pending_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
        kind: RequestKind,
    ) -> Result<Option<ConnectionRequest>, RelationError>;

    async fn accepted_exists_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
        kind: RequestKind,
    ) -> Result<bool, RelationError>;

    async fn resolve_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request_id: RequestId,
        status: RequestStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<(), RelationError>;

    /// Newest first, order by (created_at DESC, request_id DESC)
    async fn list_sent_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError>;

    /// Newest first, order by (created_at DESC, request_id DESC)
    async fn list_received_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError>;
}
