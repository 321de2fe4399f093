use crate::application_port::ErrorKind;
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("no active student profile for this account")]
    ProfileNotFound,
    #[error("store error: {0}")]
    Store(String),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::ProfileNotFound => ErrorKind::NotFound,
            IdentityError::Store(_) => ErrorKind::Internal,
        }
    }
}

#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Map an authenticated principal to its student identity.
    async fn resolve(&self, principal: UserId) -> Result<StudentId, IdentityError>;
}
