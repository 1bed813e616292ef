//! Authentication configuration.

use portal_protocol::{Identity, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const INSECURE_DEFAULT_SECRET: &str = "dev-secret-change-in-production";

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Supports `env:VAR_NAME`.
    /// The server refuses to start without it.
    pub jwt_secret: Option<String>,

    /// Accounts known to the credential store.
    pub accounts: Vec<AccountConfig>,

    /// Add the built-in demo accounts (admin, student, faculty @test.com).
    pub seed_demo_accounts: bool,

    /// Mount `GET /auth/test-accounts`. Never enable this in production.
    pub expose_test_accounts: bool,

    /// bcrypt cost used when hashing demo passwords at startup.
    pub bcrypt_cost: u32,

    /// Allowed CORS origins. If empty, cross-origin requests are denied.
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Some("env:JWT_SECRET".to_string()),
            accounts: Vec::new(),
            seed_demo_accounts: false,
            expose_test_accounts: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    /// Returns the resolved secret or None if not configured.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration and return the resolved signing secret.
    pub fn validate(&self) -> Result<String, ConfigValidationError> {
        let secret = self
            .resolve_jwt_secret()?
            .ok_or(ConfigValidationError::MissingJwtSecret)?;
        validate_secret(&secret)?;

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.email.as_str()) {
                return Err(ConfigValidationError::DuplicateAccount(
                    account.email.clone(),
                ));
            }
            if !account.password_hash.starts_with("$2") {
                return Err(ConfigValidationError::InvalidPasswordHash(
                    account.email.clone(),
                ));
            }
        }

        Ok(secret)
    }

    /// Generate a secure random JWT secret using cryptographically secure RNG.
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Check a resolved signing secret.
pub fn validate_secret(secret: &str) -> Result<(), ConfigValidationError> {
    if secret.is_empty() {
        return Err(ConfigValidationError::MissingJwtSecret);
    }
    if secret == INSECURE_DEFAULT_SECRET {
        return Err(ConfigValidationError::InsecureJwtSecret);
    }
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigValidationError::JwtSecretTooShort);
    }
    Ok(())
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// JWT secret is required.
    MissingJwtSecret,
    /// JWT secret is the insecure default value.
    InsecureJwtSecret,
    /// JWT secret is too short (minimum 32 characters).
    JwtSecretTooShort,
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
    /// Two accounts share an email.
    DuplicateAccount(String),
    /// Account password hash is not a bcrypt hash.
    InvalidPasswordHash(String),
    /// Hashing a password at startup failed.
    Hashing(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJwtSecret => {
                write!(
                    f,
                    "JWT secret is required. Set the JWT_SECRET environment variable or auth.jwt_secret in config."
                )
            }
            Self::InsecureJwtSecret => {
                write!(
                    f,
                    "JWT secret cannot be the default insecure value. Please configure a secure secret."
                )
            }
            Self::JwtSecretTooShort => {
                write!(
                    f,
                    "JWT secret must be at least {} characters long.",
                    MIN_SECRET_LEN
                )
            }
            Self::EnvVarNotFound(var) => {
                write!(
                    f,
                    "Environment variable '{}' not found (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::EnvVarEmpty(var) => {
                write!(
                    f,
                    "Environment variable '{}' is empty (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::DuplicateAccount(email) => {
                write!(f, "Account '{}' is configured more than once.", email)
            }
            Self::InvalidPasswordHash(email) => {
                write!(
                    f,
                    "Account '{}' has a password_hash that is not a bcrypt hash.",
                    email
                )
            }
            Self::Hashing(msg) => write!(f, "Failed to hash password: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Account configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Email address (login key).
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Role.
    pub role: Role,
    /// Display picture URL.
    #[serde(default)]
    pub pic: String,
    /// Password hash (bcrypt).
    pub password_hash: String,
    /// Cleartext password shown by the test-accounts listing.
    /// Only set for throwaway demo accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_password: Option<String>,
}

impl AccountConfig {
    /// Identity issued for this account.
    pub fn identity(&self) -> Identity {
        Identity {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            display_picture_url: self.pic.clone(),
        }
    }

    /// Verify a password against this account's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
