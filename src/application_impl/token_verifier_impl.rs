use crate::application_port::*;
use crate::domain_model::UserId;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String, // user id as string
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
}

fn decode_access(token: &str, cfg: &JwtConfig) -> Result<AccessClaims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    Ok(data.claims)
}

/// Verifies HS256 access tokens minted by the account service.
pub struct JwtHs256Verifier {
    cfg: JwtConfig,
}

impl JwtHs256Verifier {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Verifier { cfg }
    }
}

#[async_trait::async_trait]
impl TokenVerifier for JwtHs256Verifier {
    async fn verify_access_token(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = decode_access(token, &self.cfg)?;
        claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn config() -> JwtConfig {
        JwtConfig {
            issuer: "fyp-accounts".to_string(),
            audience: "fypmatch".to_string(),
            signing_key: b"test-signing-key".to_vec(),
        }
    }

    fn mint(sub: &str, audience: &str, ttl: Duration, key: &[u8]) -> String {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: sub.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: "fyp-accounts".to_string(),
            aud: audience.to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_yields_subject() {
        let verifier = JwtHs256Verifier::new(config());
        let user = UserId(uuid::Uuid::new_v4());

        let token = mint(&user.to_string(), "fypmatch", Duration::minutes(5), b"test-signing-key");
        assert_eq!(verifier.verify_access_token(&token).await.unwrap(), user);
    }

    #[tokio::test]
    async fn rejects_expired_foreign_and_malformed_tokens() {
        let verifier = JwtHs256Verifier::new(config());
        let sub = uuid::Uuid::new_v4().to_string();

        let expired = mint(&sub, "fypmatch", Duration::hours(-2), b"test-signing-key");
        assert!(matches!(
            verifier.verify_access_token(&expired).await,
            Err(AuthError::TokenExpired)
        ));

        let other_audience = mint(&sub, "someone-else", Duration::minutes(5), b"test-signing-key");
        let other_key = mint(&sub, "fypmatch", Duration::minutes(5), b"another-key");
        let bad_subject = mint("not-a-uuid", "fypmatch", Duration::minutes(5), b"test-signing-key");
        for token in [other_audience, other_key, bad_subject, "garbage".to_string()] {
            assert!(matches!(
                verifier.verify_access_token(&token).await,
                Err(AuthError::TokenInvalid)
            ));
        }
    }
}
