//! HTTP API module.
//!
//! Session endpoints plus the role-gated groups external routes mount into.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, INTERNAL_MESSAGE};
pub use handlers::{CREDENTIALS_REQUIRED_MESSAGE, LOGOUT_MESSAGE};
pub use routes::{ProtectedRoutes, create_router, create_router_with_routes};
pub use state::AppState;
