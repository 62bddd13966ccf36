//! Identity-service vocabulary.
//!
//! Error codes travel over the wire as their string form so that codes a
//! client does not know about still arrive intact and land in
//! [`AuthErrorCode::Other`].

use serde::{Deserialize, Serialize};

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Categorical failure reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthErrorCode {
    /// An account already exists for this email.
    EmailAlreadyInUse,
    /// The email address is malformed.
    InvalidEmail,
    /// The password is too short.
    WeakPassword,
    /// The password does not match the account.
    WrongPassword,
    /// No account exists for this email.
    UserNotFound,
    /// Combined "email or password wrong" code.
    InvalidCredentials,
    /// Any code this client does not recognise.
    Other(String),
}

impl AuthErrorCode {
    /// Parses a wire code such as `auth/invalid-email`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/email-already-in-use" => Self::EmailAlreadyInUse,
            "auth/invalid-email" => Self::InvalidEmail,
            "auth/weak-password" => Self::WeakPassword,
            "auth/wrong-password" => Self::WrongPassword,
            "auth/user-not-found" => Self::UserNotFound,
            "auth/invalid-login-credentials" => Self::InvalidCredentials,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub fn as_code(&self) -> &str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::InvalidEmail => "auth/invalid-email",
            Self::WeakPassword => "auth/weak-password",
            Self::WrongPassword => "auth/wrong-password",
            Self::UserNotFound => "auth/user-not-found",
            Self::InvalidCredentials => "auth/invalid-login-credentials",
            Self::Other(code) => code,
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Loose shape check for an email address: `local@domain.tld`, no spaces.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Checks the credentials of a new account.
///
/// Surrounding whitespace in the email is ignored, matching how accounts
/// are keyed and looked up.
///
/// # Errors
///
/// Returns [`AuthErrorCode::InvalidEmail`] for a malformed address and
/// [`AuthErrorCode::WeakPassword`] when the password is shorter than
/// [`MIN_PASSWORD_LENGTH`].
pub fn validate_new_account(email: &str, password: &str) -> Result<(), AuthErrorCode> {
    if !is_valid_email(email.trim()) {
        return Err(AuthErrorCode::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthErrorCode::WeakPassword);
    }
    Ok(())
}

/// Case-folds an email for use as an account key.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
