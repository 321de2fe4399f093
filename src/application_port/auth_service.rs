use crate::domain_model::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Session issuance lives with the auth collaborator; this side only verifies.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_access_token(&self, token: &str) -> Result<UserId, AuthError>;
}
