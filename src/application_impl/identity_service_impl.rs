use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealIdentityService {
    student_repo: Arc<dyn StudentRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealIdentityService {
    pub fn new(student_repo: Arc<dyn StudentRepo>, tx_manager: Arc<dyn TxManager>) -> Self {
        RealIdentityService {
            student_repo,
            tx_manager,
        }
    }
}

#[async_trait::async_trait]
impl IdentityService for RealIdentityService {
    async fn resolve(&self, principal: UserId) -> Result<StudentId, IdentityError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| IdentityError::Store(e.to_string()))?;

        let student = self
            .student_repo
            .get_by_user_in_tx(&mut *tx, principal)
            .await
            .map_err(|e| IdentityError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| IdentityError::Store(e.to_string()))?;

        // inactive profiles resolve like missing ones
        match student {
            Some(student) if student.is_active() => Ok(student.student_id),
            _ => {
                tracing::trace!(%principal, "no active student profile");
                Err(IdentityError::ProfileNotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::testkit::TestKit;

    #[tokio::test]
    async fn resolves_active_students_only() {
        let kit = TestKit::new();
        let a = kit.student("a").await;
        kit.seed(|s| {
            s.name = "gone".to_string();
            s.account_status = AccountStatus::DeletionRequested;
        })
        .await;

        let resolved = kit.identity.resolve(TestKit::user_of("a")).await.unwrap();
        assert_eq!(resolved, a);

        let err = kit.identity.resolve(TestKit::user_of("gone")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = kit
            .identity
            .resolve(UserId(uuid::Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::ProfileNotFound));
    }
}
