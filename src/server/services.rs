use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::GroupPolicy;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use sqlx::{MySql, Pool};
use std::sync::Arc;

/// Storage handles behind one backend, before services are built on them.
struct Repos {
    tx_manager: Arc<dyn TxManager>,
    student_repo: Arc<dyn StudentRepo>,
    request_repo: Arc<dyn RequestRepo>,
    group_repo: Arc<dyn GroupRepo>,
    conversation_repo: Arc<dyn ConversationRepo>,
    message_repo: Arc<dyn MessageRepo>,
}

/// Every application service, wired on a single storage backend.
#[derive(Clone)]
pub struct Services {
    pub tx_manager: Arc<dyn TxManager>,
    pub student_repo: Arc<dyn StudentRepo>,
    pub identity_service: Arc<dyn IdentityService>,
    pub discovery_service: Arc<dyn DiscoveryService>,
    pub request_service: Arc<dyn RequestService>,
    pub permission_oracle: Arc<dyn PermissionOracle>,
    pub group_service: Arc<dyn GroupService>,
    pub group_formation: Arc<dyn GroupFormation>,
    pub conversation_service: Arc<dyn ConversationService>,
}

impl Services {
    pub fn in_memory(policy: GroupPolicy) -> Self {
        Self::wire(
            Repos {
                tx_manager: Arc::new(MemoryTxManager::new()),
                student_repo: Arc::new(MemoryStudentRepo::new()),
                request_repo: Arc::new(MemoryRequestRepo::new()),
                group_repo: Arc::new(MemoryGroupRepo::new()),
                conversation_repo: Arc::new(MemoryConversationRepo::new()),
                message_repo: Arc::new(MemoryMessageRepo::new()),
            },
            policy,
        )
    }

    pub fn mysql(pool: Pool<MySql>, policy: GroupPolicy) -> Self {
        Self::wire(
            Repos {
                tx_manager: Arc::new(MySqlTxManager::new(pool)),
                student_repo: Arc::new(MySqlStudentRepo::new()),
                request_repo: Arc::new(MySqlRequestRepo::new()),
                group_repo: Arc::new(MySqlGroupRepo::new()),
                conversation_repo: Arc::new(MySqlConversationRepo::new()),
                message_repo: Arc::new(MySqlMessageRepo::new()),
            },
            policy,
        )
    }

    fn wire(repos: Repos, policy: GroupPolicy) -> Self {
        let Repos {
            tx_manager,
            student_repo,
            request_repo,
            group_repo,
            conversation_repo,
            message_repo,
        } = repos;

        let permission_oracle: Arc<dyn PermissionOracle> = Arc::new(RealPermissionOracle::new(
            request_repo.clone(),
            group_repo.clone(),
            tx_manager.clone(),
        ));

        // one engine behind both the member-facing and the ledger-facing port
        let group_engine = Arc::new(RealGroupService::new(
            group_repo,
            tx_manager.clone(),
            policy,
        ));
        let group_service: Arc<dyn GroupService> = group_engine.clone();
        let group_formation: Arc<dyn GroupFormation> = group_engine;

        let request_service: Arc<dyn RequestService> = Arc::new(RealRequestService::new(
            student_repo.clone(),
            request_repo,
            permission_oracle.clone(),
            group_formation.clone(),
            tx_manager.clone(),
        ));

        let conversation_service: Arc<dyn ConversationService> =
            Arc::new(RealConversationService::new(
                conversation_repo,
                message_repo,
                permission_oracle.clone(),
                tx_manager.clone(),
            ));

        let identity_service: Arc<dyn IdentityService> = Arc::new(RealIdentityService::new(
            student_repo.clone(),
            tx_manager.clone(),
        ));
        let discovery_service: Arc<dyn DiscoveryService> = Arc::new(RealDiscoveryService::new(
            student_repo.clone(),
            tx_manager.clone(),
        ));

        Services {
            tx_manager,
            student_repo,
            identity_service,
            discovery_service,
            request_service,
            permission_oracle,
            group_service,
            group_formation,
            conversation_service,
        }
    }
}
