//! Authentication module.
//!
//! Provides token issuance and verification plus the request gates:
//! - `auth_middleware` resolves a bearer token into a [`CurrentUser`]
//! - `require_role` restricts a route group to a set of roles

mod claims;
mod codec;
mod config;
mod error;
mod middleware;

pub use claims::Claims;
pub use codec::{TOKEN_TTL_SECS, TokenCodec};
pub use config::{AccountConfig, AuthConfig, ConfigValidationError, MIN_SECRET_LEN};
pub use error::{
    AuthError, FORBIDDEN_MESSAGE, INVALID_CREDENTIALS_MESSAGE, UNAUTHENTICATED_MESSAGE,
};
pub use middleware::{
    AllowedRoles, AuthState, CurrentUser, RequireAdmin, auth_middleware, require_role,
};
