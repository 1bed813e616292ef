//! Session endpoint handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use portal_protocol::{
    LoginRequest, LoginResponse, LogoutResponse, ProfileResponse, TestAccount,
    TestAccountsResponse,
};
use tracing::{debug, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthError, CurrentUser};

pub const CREDENTIALS_REQUIRED_MESSAGE: &str = "Email and password are required";
pub const LOGOUT_MESSAGE: &str = "Logged out successfully";

/// Exchange email and password for a signed token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Unreadable login body");
            return Err(ApiError::bad_request(CREDENTIALS_REQUIRED_MESSAGE));
        }
    };

    let (email, password) = match (request.email.as_deref(), request.password.as_deref()) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => return Err(ApiError::bad_request(CREDENTIALS_REQUIRED_MESSAGE)),
    };

    let Some(user) = state.auth.authenticate(email, password).await? else {
        info!(email = %email, "Login failed");
        return Err(AuthError::InvalidCredentials.into());
    };

    let token = state.auth.issue_token(&user)?;
    info!(email = %user.email, role = %user.role, "Login succeeded");

    Ok(Json(LoginResponse {
        success: true,
        user,
        token,
    }))
}

/// Acknowledge a logout. Tokens are stateless, so nothing is invalidated here.
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: LOGOUT_MESSAGE.to_string(),
    })
}

/// Return the identity carried by the bearer token.
pub async fn profile(user: CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        user: user.identity,
    })
}

/// List the accounts a tester can sign in with.
#[instrument(skip(state))]
pub async fn test_accounts(State(state): State<AppState>) -> ApiResult<Json<TestAccountsResponse>> {
    let accounts = state
        .auth
        .credentials()
        .accounts()
        .await?
        .into_iter()
        .map(|account| TestAccount {
            email: account.email,
            password: account.demo_password,
            role: account.role,
        })
        .collect::<Vec<_>>();

    debug!(count = accounts.len(), "Listed test accounts");
    Ok(Json(TestAccountsResponse { accounts }))
}
