//! JWT claims.

use portal_protocol::Identity;
use serde::{Deserialize, Serialize};

/// Claims carried by a session token.
///
/// The identity is nested under `user`; the signature covers all of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The signed identity.
    pub user: Identity,

    /// Issued at (as Unix timestamp).
    pub iat: i64,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Whether the token is expired at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
