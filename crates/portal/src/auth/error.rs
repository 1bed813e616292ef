//! Authentication errors.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::ApiError;

/// Message for every rejected bearer token, whatever the cause.
pub const UNAUTHENTICATED_MESSAGE: &str = "Authentication required";

/// Message for a failed login, whether the email or the password was wrong.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Message for a valid token whose role is not allowed.
pub const FORBIDDEN_MESSAGE: &str = "Insufficient permissions";

/// Authentication errors.
///
/// The variants keep the cause for logging; the HTTP response does not.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing authorization header.
    #[error("missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    /// Token failed verification (malformed, tampered or expired).
    #[error("invalid or expired token")]
    InvalidToken,

    /// Insufficient permissions.
    #[error("insufficient permissions: {0}")]
    InsufficientPermissions(String),

    /// Invalid credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Internal error.
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
