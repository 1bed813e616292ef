//! Wire types shared by the portal server and its clients.
//!
//! Everything here is plain data: identities, request and response bodies,
//! and the route paths both sides agree on.

mod identity;
mod messages;

pub use identity::{Identity, Role};
pub use messages::{
    ErrorBody, HealthResponse, LoginRequest, LoginResponse, LogoutResponse, ProfileResponse,
    TestAccount, TestAccountsResponse,
};

/// Key under which clients persist the raw bearer token.
pub const TOKEN_STORAGE_KEY: &str = "jwt";

/// Route paths of the session endpoints.
pub mod routes {
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const PROFILE: &str = "/auth/profile";
    pub const TEST_ACCOUNTS: &str = "/auth/test-accounts";
    pub const HEALTH: &str = "/health";

    /// Mount points of the role-gated route groups.
    pub const ADMIN_GROUP: &str = "/admin";
    pub const FACULTY_GROUP: &str = "/api/faculty";
    pub const STUDENT_GROUP: &str = "/student";

    /// Entry point front ends navigate to when a session ends.
    pub const LOGIN_PAGE: &str = "/login";
}
