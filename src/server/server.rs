use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::GroupPolicy;
use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;

pub struct Server {
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub identity_service: Arc<dyn IdentityService>,
    pub discovery_service: Arc<dyn DiscoveryService>,
    pub request_service: Arc<dyn RequestService>,
    pub permission_oracle: Arc<dyn PermissionOracle>,
    pub group_service: Arc<dyn GroupService>,
    pub conversation_service: Arc<dyn ConversationService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        if settings.group.max_members < 2 {
            return Err(anyhow::anyhow!(
                "group.max_members must be at least 2, got {}",
                settings.group.max_members
            ));
        }
        let policy = GroupPolicy {
            max_members: settings.group.max_members,
            unlock_on_removal: settings.group.unlock_on_removal,
        };

        let (services, pool) = match settings.database.backend.as_str() {
            "memory" => {
                let services = Services::in_memory(policy);
                if let Some(path) = &settings.database.seed_path {
                    let json = tokio::fs::read_to_string(path).await?;
                    let count = seed_students(&services, parse_seed(&json)?).await?;
                    info!(%path, count, "seeded students");
                }
                (services, None)
            }
            "mysql" => {
                let dsn = settings
                    .database
                    .dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("database.dsn is required for mysql"))?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(settings.database.max_connections.unwrap_or(10))
                    .connect(dsn)
                    .await?;
                (Services::mysql(pool.clone(), policy), Some(pool))
            }
            other => return Err(anyhow::anyhow!("Unknown database backend: {}", other)),
        };

        let token_verifier: Arc<dyn TokenVerifier> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeTokenVerifier::new()),
            "jwt" => {
                let key = std::env::var(&settings.auth.signing_key_env).map_err(|_| {
                    anyhow::anyhow!("{} is not set", settings.auth.signing_key_env)
                })?;
                Arc::new(JwtHs256Verifier::new(JwtConfig {
                    issuer: settings.auth.issuer.clone(),
                    audience: settings.auth.audience.clone(),
                    signing_key: key.into_bytes(),
                }))
            }
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        info!(
            database = %settings.database.backend,
            auth = %settings.auth.backend,
            max_members = policy.max_members,
            "server started"
        );

        let mut server = Self::from_services(services, token_verifier);
        server.pool = pool;
        Ok(server)
    }

    /// Builds a server over already wired services; used by API tests.
    pub fn from_services(services: Services, token_verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            token_verifier,
            identity_service: services.identity_service,
            discovery_service: services.discovery_service,
            request_service: services.request_service,
            permission_oracle: services.permission_oracle,
            group_service: services.group_service,
            conversation_service: services.conversation_service,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
