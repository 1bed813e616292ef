//! Client error types.

use std::path::PathBuf;

use thiserror::Error;

/// Fallback shown when a failed login carries no usable message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Errors from the request pipeline.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("Request failed with status code {status}")]
    Status {
        status: u16,
        /// The `error` field of the response body, if any.
        message: Option<String>,
    },

    /// The request never got a response.
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// The response body was not what the endpoint promises.
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid client configuration: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// HTTP status, for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Durable token storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to determine state directory")]
    NoStateDir,
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Message suitable for showing next to a login form.
    ///
    /// Prefers the server's own message, then the error's description.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Client(ClientError::Status {
                message: Some(message),
                ..
            }) if !message.is_empty() => message.clone(),
            other => other.to_string(),
        };

        if message.is_empty() {
            LOGIN_FAILED_MESSAGE.to_string()
        } else {
            message
        }
    }
}
