use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealPermissionOracle {
    request_repo: Arc<dyn RequestRepo>,
    group_repo: Arc<dyn GroupRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealPermissionOracle {
    pub fn new(
        request_repo: Arc<dyn RequestRepo>,
        group_repo: Arc<dyn GroupRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            request_repo,
            group_repo,
            tx_manager,
        }
    }
}

#[async_trait::async_trait]
impl PermissionOracle for RealPermissionOracle {
    async fn can_message(&self, a: StudentId, b: StudentId) -> Result<bool, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let allowed = self.can_message_in_tx(&mut *tx, a, b).await?;
        tracing::trace!(%a, %b, allowed, "can_message");

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(allowed)
    }

    async fn can_message_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: StudentId,
        b: StudentId,
    ) -> Result<bool, RelationError> {
        if a == b {
            return Ok(false);
        }

        // either direction; PARTNER acceptance counts only through group membership
        let pair = StudentPair::new(a, b);
        if self
            .request_repo
            .accepted_exists_in_tx(tx, pair, RequestKind::Message)
            .await?
        {
            return Ok(true);
        }

        let group_a = self.group_repo.group_of_in_tx(tx, a).await?;
        let group_b = self.group_repo.group_of_in_tx(tx, b).await?;
        Ok(matches!((group_a, group_b), (Some(x), Some(y)) if x == y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::testkit::TestKit;

    #[tokio::test]
    async fn strangers_cannot_message() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);

        assert!(!kit.oracle.can_message(a, b).await.unwrap());
        assert!(!kit.oracle.can_message(a, a).await.unwrap());
    }

    #[tokio::test]
    async fn pending_and_rejected_requests_grant_nothing() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);

        let request = kit
            .requests
            .send(TestKit::message_input(a, b))
            .await
            .unwrap();
        assert!(!kit.oracle.can_message(a, b).await.unwrap());

        kit.requests.reject(request.request_id, b).await.unwrap();
        assert!(!kit.oracle.can_message(b, a).await.unwrap());
    }

    #[tokio::test]
    async fn accepted_message_request_is_symmetric() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);

        kit.connect(a, b).await;

        assert!(kit.oracle.can_message(a, b).await.unwrap());
        assert!(kit.oracle.can_message(b, a).await.unwrap());
    }

    #[tokio::test]
    async fn groupmates_can_message_without_a_direct_request() {
        let kit = TestKit::new();
        let (a, b, c) = (kit.student("a").await, kit.student("b").await, kit.student("c").await);
        kit.partner(a, b).await;
        kit.partner(a, c).await;

        // b and c never exchanged a request
        assert!(kit.oracle.can_message(b, c).await.unwrap());

        kit.groups.remove_member(a, c).await.unwrap();
        assert!(!kit.oracle.can_message(b, c).await.unwrap());
        assert!(!kit.oracle.can_message(a, c).await.unwrap());
        assert!(kit.oracle.can_message(a, b).await.unwrap());
    }
}
