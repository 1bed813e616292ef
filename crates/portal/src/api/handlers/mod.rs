//! API request handlers.
//!
//! - `auth`: the session endpoints (login, logout, profile, test accounts)
//! - `misc`: health check

mod auth;
mod misc;

pub use auth::{CREDENTIALS_REQUIRED_MESSAGE, LOGOUT_MESSAGE, login, logout, profile, test_accounts};
pub use misc::health;
