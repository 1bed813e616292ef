//! Authentication middleware.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use log::{debug, warn};
use portal_protocol::{Identity, Role};
use std::sync::Arc;

use super::{AuthConfig, AuthError, ConfigValidationError, TokenCodec};
use crate::credentials::{ConfiguredAccounts, CredentialStore};

/// Password hashed at startup so unknown emails cost one bcrypt verification too.
const TIMING_DUMMY_PASSWORD: &str = "portal-unknown-account";

/// Extract a Bearer token from an Authorization header value.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    if parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Authentication state shared across handlers.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
    codec: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialStore>,
    dummy_hash: Arc<str>,
}

impl AuthState {
    /// Create auth state from config, using the accounts it defines.
    ///
    /// Fails if the signing secret is missing or weak; callers treat that as
    /// fatal at startup.
    pub fn from_config(config: AuthConfig) -> Result<Self, ConfigValidationError> {
        let credentials = ConfiguredAccounts::from_config(&config)?;
        Self::with_credentials(config, Arc::new(credentials))
    }

    /// Create auth state with an injected credential store.
    pub fn with_credentials(
        config: AuthConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigValidationError> {
        let secret = config.validate()?;
        let codec = TokenCodec::new(&secret)?;
        let dummy_hash = bcrypt::hash(TIMING_DUMMY_PASSWORD, config.bcrypt_cost)
            .map_err(|e| ConfigValidationError::Hashing(e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            codec: Arc::new(codec),
            credentials,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Credential store.
    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    /// Whether the account discovery endpoint is mounted.
    pub fn exposes_test_accounts(&self) -> bool {
        self.config.expose_test_accounts
    }

    /// Get allowed CORS origins from config.
    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    /// Check credentials against the store.
    ///
    /// Unknown emails and wrong passwords both yield `Ok(None)` after the
    /// same amount of hashing work.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, AuthError> {
        let record = self
            .credentials
            .lookup(email)
            .await
            .map_err(|e| AuthError::Internal(format!("credential lookup failed: {e:#}")))?;

        let (hash, identity) = match record {
            Some(record) => (record.password_hash, Some(record.identity)),
            None => (self.dummy_hash.to_string(), None),
        };

        let password = password.to_string();
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
                .await
                .map_err(|e| AuthError::Internal(format!("password check panicked: {e}")))?;

        Ok(identity.filter(|_| matches))
    }

    /// Issue a token for an identity.
    pub fn issue_token(&self, identity: &Identity) -> Result<String, AuthError> {
        self.codec.issue(identity)
    }

    /// Validate a token.
    pub fn validate_token(&self, token: &str) -> Result<Identity, AuthError> {
        self.codec.verify(token).ok_or(AuthError::InvalidToken)
    }
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Identity resolved from the bearer token.
    pub identity: Identity,
}

impl CurrentUser {
    /// Get the user's email.
    pub fn email(&self) -> &str {
        &self.identity.email
    }

    /// Get the user's role.
    pub fn role(&self) -> Role {
        self.identity.role
    }

    /// Check if user is admin.
    pub fn is_admin(&self) -> bool {
        self.identity.role == Role::Admin
    }

    /// Check if the user's role is one of `allowed`.
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.identity.role)
    }
}

/// Extract authentication from request.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Authentication middleware.
///
/// Validates the `Authorization: Bearer <token>` header and injects
/// `CurrentUser` into request extensions. A missing header, a malformed
/// header and a rejected token all produce the same 401 response.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let resolved = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)
        .and_then(|h| h.to_str().map_err(|_| AuthError::InvalidAuthHeader))
        .and_then(bearer_token_from_header)
        .and_then(|token| auth.validate_token(token));

    let identity = match resolved {
        Ok(identity) => identity,
        Err(e) => {
            debug!("Rejected {} {}: {}", req.method(), req.uri().path(), e);
            return Err(e);
        }
    };

    req.extensions_mut().insert(CurrentUser { identity });

    Ok(next.run(req).await)
}

/// Roles admitted by a [`require_role`] gate.
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [Role]);

impl AllowedRoles {
    pub const ADMIN: AllowedRoles = AllowedRoles(&[Role::Admin]);
    pub const FACULTY: AllowedRoles = AllowedRoles(&[Role::Faculty, Role::Admin]);
    pub const STUDENT: AllowedRoles = AllowedRoles(&[Role::Student]);
}

/// Role gate. Must run inside [`auth_middleware`].
pub async fn require_role(
    State(AllowedRoles(allowed)): State<AllowedRoles>,
    user: CurrentUser,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if !user.has_any_role(allowed) {
        warn!(
            "Denied {} {} to {} with role {}",
            req.method(),
            req.uri().path(),
            user.email(),
            user.role()
        );
        return Err(AuthError::InsufficientPermissions(format!(
            "role {} not allowed",
            user.role()
        )));
    }

    Ok(next.run(req).await)
}

/// Require admin role.
///
/// Use as an extractor in handlers that require admin access.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions(
                "admin role required".to_string(),
            ));
        }

        Ok(RequireAdmin(user))
    }
}
