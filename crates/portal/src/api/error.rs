//! Unified API error handling with structured responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use portal_protocol::ErrorBody;
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::{
    AuthError, FORBIDDEN_MESSAGE, INVALID_CREDENTIALS_MESSAGE, UNAUTHENTICATED_MESSAGE,
};

/// Body message of every 500 response. The detail only goes to the log.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// API error type with structured responses.
///
/// The message of each variant is what the client sees, except for
/// `Internal` whose message is logged and replaced.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let message = match self {
            ApiError::Internal(msg) => {
                error!(error_code = code, message = %msg, "API error");
                INTERNAL_MESSAGE.to_string()
            }
            other => {
                let message = other.to_string();
                debug!(error_code = code, message = %message, "Client error");
                message
            }
        };

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Unexpected failures from collaborators are internal errors.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{err:#}"))
    }
}

/// Convert auth errors to API errors.
///
/// Every gate rejection maps to the same message so the response does not
/// reveal why a token was refused.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken => ApiError::unauthorized(UNAUTHENTICATED_MESSAGE),
            AuthError::InvalidCredentials => ApiError::unauthorized(INVALID_CREDENTIALS_MESSAGE),
            AuthError::InsufficientPermissions(_) => ApiError::forbidden(FORBIDDEN_MESSAGE),
            AuthError::Internal(msg) => ApiError::internal(format!("Authentication error: {msg}")),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
