use crate::application_port::*;
use crate::domain_model::UserId;

const FAKE_TOKEN_PREFIX: &str = "fake-access-token:";

/// Accepts `fake-access-token:<username>` for local runs.
#[derive(Debug, Default)]
pub struct FakeTokenVerifier;

impl FakeTokenVerifier {
    pub fn new() -> Self {
        Self
    }

    pub fn token_for(username: &str) -> String {
        format!("{FAKE_TOKEN_PREFIX}{username}")
    }
}

#[async_trait::async_trait]
impl TokenVerifier for FakeTokenVerifier {
    async fn verify_access_token(&self, token: &str) -> Result<UserId, AuthError> {
        match token.strip_prefix(FAKE_TOKEN_PREFIX) {
            Some(username) if !username.is_empty() => Ok(fake_user_id(username)),
            _ => Err(AuthError::TokenInvalid),
        }
    }
}

/// Stable principal for a username, shared by the fake verifier and seed data.
pub fn fake_user_id(username: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        username.as_bytes(),
    ))
}
