//! Credential lookup.
//!
//! The session endpoints only depend on [`CredentialStore`]; where accounts
//! actually live is up to the implementation.

mod configured;

pub use configured::{ConfiguredAccounts, demo_accounts};

use anyhow::Result;
use async_trait::async_trait;
use portal_protocol::{Identity, Role};

/// Stored credentials for one account.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// bcrypt hash of the password.
    pub password_hash: String,
    /// Identity issued on successful login.
    pub identity: Identity,
}

/// Account as shown by the discovery listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub email: String,
    pub role: Role,
    /// Cleartext password, only for demo accounts.
    pub demo_password: Option<String>,
}

/// Source of accounts and their password hashes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by email.
    async fn lookup(&self, email: &str) -> Result<Option<CredentialRecord>>;

    /// List known accounts, without secrets.
    async fn accounts(&self) -> Result<Vec<AccountSummary>>;
}
