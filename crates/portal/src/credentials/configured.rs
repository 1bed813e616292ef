//! Accounts defined in the configuration file.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use portal_protocol::Role;
use tracing::info;

use super::{AccountSummary, CredentialRecord, CredentialStore};
use crate::auth::{AccountConfig, AuthConfig, ConfigValidationError};

const DEMO_PICTURE: &str = "https://via.placeholder.com/150";

/// Credential store backed by `auth.accounts`.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredAccounts {
    by_email: HashMap<String, CredentialRecord>,
    summaries: Vec<AccountSummary>,
}

impl ConfiguredAccounts {
    /// Build the store from the auth config, hashing demo accounts if enabled.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigValidationError> {
        let mut store = Self::default();
        for account in &config.accounts {
            store.insert(account);
        }

        if config.seed_demo_accounts {
            let mut seeded = 0;
            for account in demo_accounts(config.bcrypt_cost)? {
                if store.by_email.contains_key(&account.email) {
                    continue;
                }
                store.insert(&account);
                seeded += 1;
            }
            info!(count = seeded, "Seeded demo accounts");
        }

        Ok(store)
    }

    /// Build the store from explicit accounts.
    pub fn new(accounts: &[AccountConfig]) -> Self {
        let mut store = Self::default();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    fn insert(&mut self, account: &AccountConfig) {
        self.by_email.insert(
            account.email.clone(),
            CredentialRecord {
                password_hash: account.password_hash.clone(),
                identity: account.identity(),
            },
        );
        self.summaries.push(AccountSummary {
            email: account.email.clone(),
            role: account.role,
            demo_password: account.demo_password.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

#[async_trait]
impl CredentialStore for ConfiguredAccounts {
    async fn lookup(&self, email: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.by_email.get(email).cloned())
    }

    async fn accounts(&self) -> Result<Vec<AccountSummary>> {
        Ok(self.summaries.clone())
    }
}

/// The three throwaway accounts of the demo deployment.
pub fn demo_accounts(cost: u32) -> Result<Vec<AccountConfig>, ConfigValidationError> {
    [
        ("admin@test.com", "admin123", "Admin", Role::Admin),
        ("student@test.com", "student123", "Student", Role::Student),
        ("faculty@test.com", "faculty123", "Faculty", Role::Faculty),
    ]
    .into_iter()
    .map(|(email, password, first_name, role)| {
        let password_hash = bcrypt::hash(password, cost)
            .map_err(|e| ConfigValidationError::Hashing(e.to_string()))?;
        Ok(AccountConfig {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: "User".to_string(),
            role,
            pic: DEMO_PICTURE.to_string(),
            password_hash,
            demo_password: Some(password.to_string()),
        })
    })
    .collect()
}
