use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, code, message) = if let Some(e) = err.find::<ApiRejection>() {
        (e.code.status(), e.code, e.message.clone())
    } else if err.is_not_found() {
        let code = ApiErrorCode::NotFound;
        (code.status(), code, "no such route".to_string())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        let code = ApiErrorCode::InvalidToken;
        (code.status(), code, e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        let code = ApiErrorCode::InvalidRequest;
        (code.status(), code, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        let code = ApiErrorCode::InvalidRequest;
        (code.status(), code, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InvalidRequest,
            "method not allowed".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::InternalError,
            format!("Unhandled error: {:?}", err),
        )
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Malformed request")]
    InvalidRequest,
    #[error("Not found")]
    NotFound,
    #[error("Forbidden")]
    Forbidden,
    #[error("Conflict")]
    Conflict,
    #[error("Invalid operation")]
    InvalidOperation,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidToken | ApiErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidRequest | ApiErrorCode::InvalidOperation => {
                StatusCode::BAD_REQUEST
            }
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::Conflict => StatusCode::CONFLICT,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorKind> for ApiErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ApiErrorCode::NotFound,
            ErrorKind::Forbidden => ApiErrorCode::Forbidden,
            ErrorKind::Conflict => ApiErrorCode::Conflict,
            ErrorKind::InvalidOperation => ApiErrorCode::InvalidOperation,
            ErrorKind::Internal => ApiErrorCode::InternalError,
        }
    }
}

/// Rejection carrying the client-facing code and message. Internal details are logged, not sent.
#[derive(Debug)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
}

impl reject::Reject for ApiRejection {}

impl ApiRejection {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiRejection {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request<E: std::fmt::Display>(error: E) -> Self {
        Self::new(ApiErrorCode::InvalidRequest, error.to_string())
    }

    fn from_kind(kind: ErrorKind, error: &dyn std::fmt::Display) -> Self {
        let code = ApiErrorCode::from(kind);
        if code == ApiErrorCode::InternalError {
            warn!("Internal error: {}", error);
            return Self::new(code, code.to_string());
        }
        Self::new(code, error.to_string())
    }
}

impl From<RelationError> for ApiRejection {
    fn from(error: RelationError) -> Self {
        Self::from_kind(error.kind(), &error)
    }
}

impl From<ChatError> for ApiRejection {
    fn from(error: ChatError) -> Self {
        Self::from_kind(error.kind(), &error)
    }
}

impl From<IdentityError> for ApiRejection {
    fn from(error: IdentityError) -> Self {
        Self::from_kind(error.kind(), &error)
    }
}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenInvalid => Self::new(ApiErrorCode::InvalidToken, error.to_string()),
            AuthError::TokenExpired => Self::new(ApiErrorCode::TokenExpired, error.to_string()),
            AuthError::InternalError(e) => {
                Self::from_kind(ErrorKind::Internal, &format!("auth: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_statuses() {
        let cases = [
            (RelationError::RequestNotFound, StatusCode::NOT_FOUND),
            (RelationError::NotRecipient, StatusCode::FORBIDDEN),
            (RelationError::GroupFull, StatusCode::CONFLICT),
            (RelationError::SelfRequest, StatusCode::BAD_REQUEST),
            (RelationError::Store("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiRejection::from(error).code.status(), status);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let rejection = ApiRejection::from(ChatError::Store("secret dsn".into()));
        assert_eq!(rejection.code, ApiErrorCode::InternalError);
        assert!(!rejection.message.contains("secret"));
    }
}
