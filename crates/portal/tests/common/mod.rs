//! Test utilities and common setup.
#![allow(dead_code, clippy::field_reassign_with_default)]

use axum::{Router, routing::get};
use portal::api::{self, AppState, ProtectedRoutes};
use portal::auth::{AuthConfig, AuthState, CurrentUser};
use portal_protocol::Role;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Auth config with the demo accounts seeded at a cheap bcrypt cost.
pub fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.jwt_secret = Some(TEST_SECRET.to_string());
    config.seed_demo_accounts = true;
    config.expose_test_accounts = true;
    config.bcrypt_cost = 4;
    config
}

pub fn test_state_with(config: AuthConfig) -> AppState {
    AppState::new(AuthState::from_config(config).unwrap())
}

pub fn test_state() -> AppState {
    test_state_with(test_auth_config())
}

/// Create a test application with no role-gated groups.
pub fn test_app() -> Router {
    api::create_router(test_state())
}

async fn whoami(user: CurrentUser) -> String {
    user.email().to_string()
}

/// Stub routes standing in for the portal's CRUD screens.
pub fn stub_groups() -> ProtectedRoutes {
    ProtectedRoutes::new()
        .admin(Router::new().route("/dashboard", get(whoami)))
        .faculty(Router::new().route("/records", get(whoami)))
        .student(Router::new().route("/records", get(whoami)))
}

/// Create a test application with stub routes in every role group.
pub fn test_app_with_groups() -> (Router, AppState) {
    let state = test_state();
    let app = api::create_router_with_routes(state.clone(), stub_groups());
    (app, state)
}

/// Demo credentials for a role.
pub fn demo_credentials(role: Role) -> (&'static str, &'static str) {
    match role {
        Role::Admin => ("admin@test.com", "admin123"),
        Role::Faculty => ("faculty@test.com", "faculty123"),
        Role::Student => ("student@test.com", "student123"),
    }
}

/// Issue a token for a demo account without going through login.
pub async fn token_for(state: &AppState, role: Role) -> String {
    let (email, password) = demo_credentials(role);
    let identity = state
        .auth
        .authenticate(email, password)
        .await
        .unwrap()
        .unwrap();
    state.auth.issue_token(&identity).unwrap()
}
