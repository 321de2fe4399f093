use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct RealRequestService {
    student_repo: Arc<dyn StudentRepo>,
    request_repo: Arc<dyn RequestRepo>,
    oracle: Arc<dyn PermissionOracle>,
    group_formation: Arc<dyn GroupFormation>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealRequestService {
    pub fn new(
        student_repo: Arc<dyn StudentRepo>,
        request_repo: Arc<dyn RequestRepo>,
        oracle: Arc<dyn PermissionOracle>,
        group_formation: Arc<dyn GroupFormation>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            student_repo,
            request_repo,
            oracle,
            group_formation,
            tx_manager,
        }
    }

    async fn active_student_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student_id: StudentId,
    ) -> Result<Student, RelationError> {
        match self.student_repo.get_in_tx(tx, student_id).await? {
            Some(student) if student.is_active() => Ok(student),
            _ => Err(RelationError::StudentNotFound),
        }
    }

    /// Loads a pending request addressed to `by`, locked for the rest of the transaction.
    async fn pending_for_recipient_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        request_id: RequestId,
        by: StudentId,
    ) -> Result<ConnectionRequest, RelationError> {
        let request = self
            .request_repo
            .get_for_update_in_tx(tx, request_id)
            .await?
            .ok_or(RelationError::RequestNotFound)?;
        if request.to != by {
            return Err(RelationError::NotRecipient);
        }
        if request.status.is_terminal() {
            return Err(RelationError::AlreadyResolved(request.status));
        }
        Ok(request)
    }

    async fn resolve(
        &self,
        request_id: RequestId,
        by: StudentId,
        status: RequestStatus,
    ) -> Result<ConnectionRequest, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let mut request = self
            .pending_for_recipient_in_tx(&mut *tx, request_id, by)
            .await?;

        let now = Utc::now();
        self.request_repo
            .resolve_in_tx(&mut *tx, request_id, status, now)
            .await?;
        request.status = status;
        request.resolved_at = Some(now);

        if status == RequestStatus::Accepted && request.kind == RequestKind::Partner {
            let merged = self
                .group_formation
                .merge_on_partner_accept_in_tx(&mut *tx, request.from, request.to)
                .await;
            // the status change above is discarded together with the failed merge
            if let Err(e) = merged {
                tracing::info!(request = %request_id, "partner accept rolled back: {e}");
                if let Err(rb) = tx.rollback().await {
                    tracing::warn!("rollback: {rb}");
                }
                return Err(e);
            }
        }

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        tracing::info!(
            request = %request_id,
            kind = %request.kind,
            from = %request.from,
            to = %request.to,
            "request {status}"
        );
        Ok(request)
    }
}

fn validate_reason(kind: RequestKind, reason: Option<&str>) -> Result<(), RelationError> {
    let Some(reason) = reason else {
        return Ok(());
    };
    if kind == RequestKind::Partner {
        return Err(RelationError::InvalidInput(
            "partner requests do not carry a reason",
        ));
    }
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(RelationError::InvalidInput("reason is too long"));
    }
    Ok(())
}

#[async_trait::async_trait]
impl RequestService for RealRequestService {
    async fn send(&self, input: SendRequestInput) -> Result<ConnectionRequest, RelationError> {
        let SendRequestInput {
            kind,
            from,
            to,
            reason,
        } = input;
        if from == to {
            return Err(RelationError::SelfRequest);
        }
        let reason = reason.filter(|r| !r.trim().is_empty());
        validate_reason(kind, reason.as_deref())?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let sender = self.active_student_in_tx(&mut *tx, from).await?;
        let target = self.active_student_in_tx(&mut *tx, to).await?;

        let pair = StudentPair::new(from, to);
        if self
            .request_repo
            .find_pending_in_tx(&mut *tx, pair, kind)
            .await?
            .is_some()
        {
            return Err(RelationError::RequestExists(kind));
        }

        match kind {
            RequestKind::Partner => {
                if !sender.is_matchable() || !target.is_matchable() {
                    return Err(RelationError::NotMatchable);
                }
                self.group_formation
                    .check_partner_request_in_tx(&mut *tx, from, to)
                    .await?;
            }
            RequestKind::Message => {
                if self.oracle.can_message_in_tx(&mut *tx, from, to).await? {
                    return Err(RelationError::AlreadyConnected);
                }
            }
        }

        let request = ConnectionRequest {
            request_id: RequestId(Uuid::new_v4()),
            kind,
            from,
            to,
            status: RequestStatus::Pending,
            reason,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.request_repo.insert_in_tx(&mut *tx, &request).await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        tracing::info!(request = %request.request_id, %kind, %from, %to, "request sent");
        Ok(request)
    }

    async fn accept(
        &self,
        request_id: RequestId,
        by: StudentId,
    ) -> Result<ConnectionRequest, RelationError> {
        self.resolve(request_id, by, RequestStatus::Accepted).await
    }

    async fn reject(
        &self,
        request_id: RequestId,
        by: StudentId,
    ) -> Result<ConnectionRequest, RelationError> {
        self.resolve(request_id, by, RequestStatus::Rejected).await
    }

    async fn list_sent(
        &self,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let requests = self
            .request_repo
            .list_sent_in_tx(&mut *tx, student, page_size, before)
            .await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(requests)
    }

    async fn list_received(
        &self,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let requests = self
            .request_repo
            .list_received_in_tx(&mut *tx, student, page_size, before)
            .await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::testkit::TestKit;

    #[tokio::test]
    async fn self_requests_are_invalid() {
        let kit = TestKit::new();
        let a = kit.student("a").await;

        let err = kit.requests.send(TestKit::message_input(a, a)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn unknown_or_inactive_students_are_not_found() {
        let kit = TestKit::new();
        let a = kit.student("a").await;
        let ghost = StudentId(Uuid::new_v4());
        let suspended = kit
            .seed(|s| {
                s.name = "s".to_string();
                s.account_status = AccountStatus::Suspended;
            })
            .await;

        for to in [ghost, suspended] {
            let err = kit.requests.send(TestKit::message_input(a, to)).await.unwrap_err();
            assert!(matches!(err, RelationError::StudentNotFound));
        }
    }

    #[tokio::test]
    async fn reason_rules() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);

        let mut partner = TestKit::partner_input(a, b);
        partner.reason = Some("let's build something".to_string());
        let err = kit.requests.send(partner).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let mut message = TestKit::message_input(a, b);
        message.reason = Some("x".repeat(MAX_REASON_LEN + 1));
        let err = kit.requests.send(message).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let mut message = TestKit::message_input(a, b);
        message.reason = Some("x".repeat(MAX_REASON_LEN));
        let sent = kit.requests.send(message).await.unwrap();
        assert_eq!(sent.reason.map(|r| r.len()), Some(MAX_REASON_LEN));
    }

    #[tokio::test]
    async fn pending_duplicates_conflict_in_both_directions() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);

        kit.requests.send(TestKit::message_input(a, b)).await.unwrap();

        let err = kit.requests.send(TestKit::message_input(a, b)).await.unwrap_err();
        assert!(matches!(err, RelationError::RequestExists(RequestKind::Message)));
        let err = kit.requests.send(TestKit::message_input(b, a)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // a different kind is a different ledger entry
        kit.requests.send(TestKit::partner_input(b, a)).await.unwrap();
    }

    #[tokio::test]
    async fn partner_requests_need_matching_semesters() {
        let kit = TestKit::new();
        let a = kit.student("a").await;
        let junior = kit
            .seed(|s| {
                s.name = "junior".to_string();
                s.semester = 3;
            })
            .await;

        let err = kit
            .requests
            .send(TestKit::partner_input(a, junior))
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::NotMatchable));

        // messaging is not restricted by semester
        kit.requests.send(TestKit::message_input(a, junior)).await.unwrap();
    }

    #[tokio::test]
    async fn partner_requests_respect_existing_groups() {
        let kit = TestKit::new();
        let (a, b, c, d) = (
            kit.student("a").await,
            kit.student("b").await,
            kit.student("c").await,
            kit.student("d").await,
        );
        kit.partner(a, b).await;
        kit.partner(c, d).await;

        let err = kit.requests.send(TestKit::partner_input(a, b)).await.unwrap_err();
        assert!(matches!(err, RelationError::AlreadyGroupmates));
        let err = kit.requests.send(TestKit::partner_input(a, c)).await.unwrap_err();
        assert!(matches!(err, RelationError::GroupsCannotMerge));
    }

    #[tokio::test]
    async fn message_request_conflicts_when_already_connected() {
        let kit = TestKit::new();
        let (a, b, c) = (kit.student("a").await, kit.student("b").await, kit.student("c").await);
        kit.connect(a, b).await;
        kit.partner(a, c).await;

        let err = kit.requests.send(TestKit::message_input(b, a)).await.unwrap_err();
        assert!(matches!(err, RelationError::AlreadyConnected));
        let err = kit.requests.send(TestKit::message_input(c, a)).await.unwrap_err();
        assert!(matches!(err, RelationError::AlreadyConnected));
    }

    #[tokio::test]
    async fn only_the_recipient_resolves() {
        let kit = TestKit::new();
        let (a, b, c) = (kit.student("a").await, kit.student("b").await, kit.student("c").await);
        let request = kit.requests.send(TestKit::message_input(a, b)).await.unwrap();

        for by in [a, c] {
            let err = kit.requests.accept(request.request_id, by).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden);
            let err = kit.requests.reject(request.request_id, by).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden);
        }

        let err = kit
            .requests
            .accept(RequestId(Uuid::new_v4()), b)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn resolved_requests_stay_resolved() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);
        let request = kit.requests.send(TestKit::message_input(a, b)).await.unwrap();

        let rejected = kit.requests.reject(request.request_id, b).await.unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert!(rejected.resolved_at.is_some());

        let err = kit.requests.accept(request.request_id, b).await.unwrap_err();
        assert!(matches!(
            err,
            RelationError::AlreadyResolved(RequestStatus::Rejected)
        ));

        // a rejected request does not block a new one
        kit.requests.send(TestKit::message_input(a, b)).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_partner_request_leaves_groups_untouched() {
        let kit = TestKit::new();
        let (a, b, c) = (kit.student("a").await, kit.student("b").await, kit.student("c").await);

        let request = kit.requests.send(TestKit::partner_input(a, b)).await.unwrap();
        kit.requests.reject(request.request_id, b).await.unwrap();
        assert!(kit.groups.my_group(a).await.unwrap().is_none());
        assert!(kit.groups.my_group(b).await.unwrap().is_none());

        let resent = kit.requests.send(TestKit::partner_input(a, b)).await.unwrap();
        assert_eq!(resent.status, RequestStatus::Pending);
        assert_ne!(resent.request_id, request.request_id);

        // an existing group is not touched either
        kit.partner(a, c).await;
        let before = kit.groups.my_group(a).await.unwrap().unwrap();
        kit.requests.reject(resent.request_id, b).await.unwrap();
        let after = kit.groups.my_group(a).await.unwrap().unwrap();
        assert_eq!(after.group_id, before.group_id);
        assert_eq!(after.member_count(), 2);
        assert_eq!(after.is_locked, before.is_locked);
        assert!(kit.groups.my_group(b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_merge_leaves_request_pending() {
        let kit = TestKit::new();
        let (a, b, c, d) = (
            kit.student("a").await,
            kit.student("b").await,
            kit.student("c").await,
            kit.student("d").await,
        );
        // two pending partner requests for b: both valid when sent
        let from_c = kit.requests.send(TestKit::partner_input(c, b)).await.unwrap();
        let from_d = kit.requests.send(TestKit::partner_input(d, b)).await.unwrap();
        kit.partner(a, b).await;
        kit.requests.accept(from_c.request_id, b).await.unwrap();

        // the group {a, b, c} is full and locked now
        let err = kit.requests.accept(from_d.request_id, b).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let received = kit.requests.list_received(b, PageSize::default(), None).await.unwrap();
        let stale = received
            .iter()
            .find(|r| r.request_id == from_d.request_id)
            .unwrap();
        assert_eq!(stale.status, RequestStatus::Pending);
        assert!(kit.groups.my_group(d).await.unwrap().is_none());
        assert_eq!(kit.groups.my_group(b).await.unwrap().unwrap().member_count(), 3);
    }

    #[tokio::test]
    async fn lists_are_newest_first_and_resumable() {
        let kit = TestKit::new();
        let a = kit.student("a").await;
        let mut targets = Vec::new();
        for name in ["b", "c", "d", "e"] {
            let to = kit.student(name).await;
            kit.requests.send(TestKit::message_input(a, to)).await.unwrap();
            targets.push(to);
        }

        let first = kit.requests.list_sent(a, PageSize(3), None).await.unwrap();
        assert_eq!(first.len(), 3);
        let cursor = RequestCursor::of(first.last().unwrap());
        let rest = kit.requests.list_sent(a, PageSize(3), Some(cursor)).await.unwrap();
        assert_eq!(rest.len(), 1);

        let mut seen: Vec<StudentId> = first.iter().chain(rest.iter()).map(|r| r.to).collect();
        assert!(
            first
                .windows(2)
                .all(|w| RequestCursor::of(&w[0]) > RequestCursor::of(&w[1]))
        );
        seen.sort();
        targets.sort();
        assert_eq!(seen, targets);

        let received = kit.requests.list_received(targets[0], PageSize::default(), None).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].from, a);
    }
}
