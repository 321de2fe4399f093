//! Seeding helpers shared by the service tests. Everything runs on the memory backend.

use crate::application_impl::fake_user_id;
use crate::application_port::*;
use crate::domain_model::*;
use crate::server::Services;
use std::sync::Arc;

pub struct TestKit {
    pub services: Services,
    pub requests: Arc<dyn RequestService>,
    pub groups: Arc<dyn GroupService>,
    pub oracle: Arc<dyn PermissionOracle>,
    pub chat: Arc<dyn ConversationService>,
    pub identity: Arc<dyn IdentityService>,
    pub discovery: Arc<dyn DiscoveryService>,
}

impl TestKit {
    pub fn new() -> Self {
        Self::with_policy(GroupPolicy::default())
    }

    pub fn with_policy(policy: GroupPolicy) -> Self {
        let services = Services::in_memory(policy);
        TestKit {
            requests: services.request_service.clone(),
            groups: services.group_service.clone(),
            oracle: services.permission_oracle.clone(),
            chat: services.conversation_service.clone(),
            identity: services.identity_service.clone(),
            discovery: services.discovery_service.clone(),
            services,
        }
    }

    pub fn user_of(name: &str) -> UserId {
        fake_user_id(name)
    }

    /// Active, available, semester 6 student, tweaked by `edit`. The user id follows the name.
    pub async fn seed(&self, edit: impl FnOnce(&mut Student)) -> StudentId {
        let mut student = Student {
            student_id: StudentId(uuid::Uuid::new_v4()),
            user_id: UserId(uuid::Uuid::nil()),
            name: "student".to_string(),
            semester: 6,
            availability: Availability::Available,
            account_status: AccountStatus::Active,
        };
        edit(&mut student);
        student.user_id = fake_user_id(&student.name);

        let mut tx = self.services.tx_manager.begin().await.unwrap();
        self.services
            .student_repo
            .insert_in_tx(&mut *tx, &student)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        student.student_id
    }

    pub async fn student(&self, name: &str) -> StudentId {
        self.seed(|s| s.name = name.to_string()).await
    }

    pub fn partner_input(from: StudentId, to: StudentId) -> SendRequestInput {
        SendRequestInput {
            kind: RequestKind::Partner,
            from,
            to,
            reason: None,
        }
    }

    pub fn message_input(from: StudentId, to: StudentId) -> SendRequestInput {
        SendRequestInput {
            kind: RequestKind::Message,
            from,
            to,
            reason: None,
        }
    }

    /// PARTNER request from `a`, accepted by `b`.
    pub async fn partner(&self, a: StudentId, b: StudentId) {
        let request = self.requests.send(Self::partner_input(a, b)).await.unwrap();
        self.requests.accept(request.request_id, b).await.unwrap();
    }

    /// MESSAGE request from `a`, accepted by `b`.
    pub async fn connect(&self, a: StudentId, b: StudentId) {
        let request = self.requests.send(Self::message_input(a, b)).await.unwrap();
        self.requests.accept(request.request_id, b).await.unwrap();
    }
}
