//! In-process identity service.
//!
//! Accounts live only as long as the process. Used by the offline mode of
//! the binary and by tests.

use std::collections::HashMap;

use parking_lot::Mutex;
use stickywall_proto::auth::{self, AuthErrorCode};

use super::{AuthError, IdentityService, Session};

struct Account {
    user_id: String,
    email: String,
    password: String,
}

/// In-memory [`IdentityService`].
#[derive(Default)]
pub struct MemoryIdentity {
    /// Normalized email -> account.
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryIdentity {
    /// Creates a service with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.lock().len()
    }
}

impl IdentityService for MemoryIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        auth::validate_new_account(email, password).map_err(AuthError::Rejected)?;

        let key = auth::normalize_email(email);
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(&key) {
            return Err(AuthError::Rejected(AuthErrorCode::EmailAlreadyInUse));
        }

        let account = Account {
            user_id: uuid::Uuid::now_v7().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let session = Session {
            user_id: account.user_id.clone(),
            email: account.email.clone(),
        };
        accounts.insert(key, account);
        drop(accounts);
        tracing::debug!(user_id = %session.user_id, "account created");
        Ok(session)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if !auth::is_valid_email(email.trim()) {
            return Err(AuthError::Rejected(AuthErrorCode::InvalidEmail));
        }

        let accounts = self.accounts.lock();
        let account = accounts
            .get(&auth::normalize_email(email))
            .ok_or(AuthError::Rejected(AuthErrorCode::UserNotFound))?;
        if account.password != password {
            return Err(AuthError::Rejected(AuthErrorCode::WrongPassword));
        }
        Ok(Session {
            user_id: account.user_id.clone(),
            email: account.email.clone(),
        })
    }
}
