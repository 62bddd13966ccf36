//! Account registry for the development server.
//!
//! Accounts are held in memory and lost on restart. Passwords are stored
//! and compared as given.

use std::collections::HashMap;

use stickywall_proto::auth::{self, AuthErrorCode};
use tokio::sync::RwLock;

/// A signed-in account as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Stable account identifier.
    pub user_id: String,
    /// Email as registered.
    pub email: String,
}

struct AccountEntry {
    account: Account,
    password: String,
}

/// In-memory directory of registered accounts, keyed by normalized email.
#[derive(Default)]
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, AccountEntry>>,
}

impl AccountRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthErrorCode::InvalidEmail`], [`AuthErrorCode::WeakPassword`]
    /// or [`AuthErrorCode::EmailAlreadyInUse`].
    pub async fn register(&self, email: &str, password: &str) -> Result<Account, AuthErrorCode> {
        auth::validate_new_account(email, password)?;

        let key = auth::normalize_email(email);
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthErrorCode::EmailAlreadyInUse);
        }

        let account = Account {
            user_id: uuid::Uuid::now_v7().to_string(),
            email: email.trim().to_string(),
        };
        accounts.insert(
            key,
            AccountEntry {
                account: account.clone(),
                password: password.to_string(),
            },
        );
        tracing::info!(user_id = %account.user_id, "account registered");
        Ok(account)
    }

    /// Checks credentials of an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthErrorCode::InvalidEmail`] for a malformed address and
    /// [`AuthErrorCode::InvalidCredentials`] for an unknown account or a
    /// wrong password alike.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Account, AuthErrorCode> {
        if !auth::is_valid_email(email.trim()) {
            return Err(AuthErrorCode::InvalidEmail);
        }

        let accounts = self.accounts.read().await;
        match accounts.get(&auth::normalize_email(email)) {
            Some(entry) if entry.password == password => Ok(entry.account.clone()),
            _ => Err(AuthErrorCode::InvalidCredentials),
        }
    }

    /// Number of registered accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Whether no account is registered.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}
