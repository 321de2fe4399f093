use super::repo_tx_memory::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct MemoryRequestRepo;

impl MemoryRequestRepo {
    pub fn new() -> Self {
        MemoryRequestRepo
    }

    fn newest_first<'a>(
        rows: impl Iterator<Item = &'a ConnectionRequest>,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Vec<ConnectionRequest> {
        let mut rows: Vec<&ConnectionRequest> = rows
            .filter(|r| before.is_none_or(|cur| RequestCursor::of(r) < cur))
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(RequestCursor::of(r)));
        rows.into_iter()
            .take(page_size.limit())
            .cloned()
            .collect()
    }
}

fn store_err(e: anyhow::Error) -> RelationError {
    RelationError::Store(e.to_string())
}

fn same_pair(request: &ConnectionRequest, pair: StudentPair) -> bool {
    StudentPair::new(request.from, request.to) == pair
}

#[async_trait::async_trait]
impl RequestRepo for MemoryRequestRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request: &ConnectionRequest,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;

        // mirrors uq_pending_pair: (student_min, student_max, kind, pending_marker)
        let pair = StudentPair::new(request.from, request.to);
        let duplicate = request.is_pending()
            && state
                .requests
                .values()
                .any(|r| r.is_pending() && r.kind == request.kind && same_pair(r, pair));
        if duplicate {
            return Err(RelationError::RequestExists(request.kind));
        }
        state.requests.insert(request.request_id, request.clone());

        Ok(())
    }

    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request_id: RequestId,
    ) -> Result<Option<ConnectionRequest>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state.requests.get(&request_id).cloned())
    }

    async fn find_pending_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
        kind: RequestKind,
    ) -> Result<Option<ConnectionRequest>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state
            .requests
            .values()
            .find(|r| r.is_pending() && r.kind == kind && same_pair(r, pair))
            .cloned())
    }

    async fn accepted_exists_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
        kind: RequestKind,
    ) -> Result<bool, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state
            .requests
            .values()
            .any(|r| r.status == RequestStatus::Accepted && r.kind == kind && same_pair(r, pair)))
    }

    async fn resolve_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request_id: RequestId,
        status: RequestStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        let request = state
            .requests
            .get_mut(&request_id)
            .ok_or(RelationError::RequestNotFound)?;
        request.status = status;
        request.resolved_at = Some(resolved_at);

        Ok(())
    }

    async fn list_sent_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        let rows = state.requests.values().filter(|r| r.from == student);
        Ok(Self::newest_first(rows, page_size, before))
    }

    async fn list_received_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        let rows = state.requests.values().filter(|r| r.to == student);
        Ok(Self::newest_first(rows, page_size, before))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryTxManager;

    fn pending(kind: RequestKind, from: StudentId, to: StudentId) -> ConnectionRequest {
        ConnectionRequest {
            request_id: RequestId(uuid::Uuid::new_v4()),
            kind,
            from,
            to,
            status: RequestStatus::Pending,
            reason: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[tokio::test]
    async fn insert_refuses_second_pending_row_for_the_pair() {
        let tx_manager = MemoryTxManager::new();
        let repo = MemoryRequestRepo::new();
        let a = StudentId(uuid::Uuid::new_v4());
        let b = StudentId(uuid::Uuid::new_v4());

        let mut tx = tx_manager.begin().await.unwrap();
        let first = pending(RequestKind::Partner, a, b);
        repo.insert_in_tx(&mut *tx, &first).await.unwrap();

        // reversed direction still hits the same pending slot
        let err = repo
            .insert_in_tx(&mut *tx, &pending(RequestKind::Partner, b, a))
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::RequestExists(RequestKind::Partner)));

        // another kind has its own slot
        repo.insert_in_tx(&mut *tx, &pending(RequestKind::Message, b, a))
            .await
            .unwrap();

        // resolving frees the slot
        repo.resolve_in_tx(&mut *tx, first.request_id, RequestStatus::Rejected, Utc::now())
            .await
            .unwrap();
        repo.insert_in_tx(&mut *tx, &pending(RequestKind::Partner, b, a))
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }
}
