//! Auth gate: the sign-in / registration form in front of the board.
//!
//! [`AuthGate`] owns the form state, submits credentials to an
//! [`IdentityService`], and turns the service's categorical error codes into
//! the short messages shown under the form.

pub mod memory;

use std::sync::Arc;

use stickywall_proto::auth::AuthErrorCode;

/// Message shown when a required field is left empty.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter your email and password";

/// Message for every failure without a more specific mapping.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

/// Errors returned by an identity service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The service answered with an error code.
    #[error("identity service rejected the request: {0}")]
    Rejected(AuthErrorCode),

    /// The service could not be reached or answered garbage.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable account id assigned by the identity service.
    pub user_id: String,
    /// Account email.
    pub email: String,
}

/// Async interface to an external identity provider.
pub trait IdentityService: Send + Sync {
    /// Creates an account and signs it in.
    fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Session, AuthError>> + Send;

    /// Verifies credentials of an existing account.
    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Session, AuthError>> + Send;
}

/// Maps an identity error code to the message shown to the user.
#[must_use]
pub fn user_message(code: &AuthErrorCode) -> &'static str {
    match code {
        AuthErrorCode::EmailAlreadyInUse => "Email is already registered",
        AuthErrorCode::InvalidEmail => "Invalid email address",
        AuthErrorCode::WeakPassword => "Password should be at least 6 characters",
        AuthErrorCode::WrongPassword
        | AuthErrorCode::UserNotFound
        | AuthErrorCode::InvalidCredentials => "Invalid email address or password",
        AuthErrorCode::Other(_) => GENERIC_ERROR_MESSAGE,
    }
}

/// Maps any [`AuthError`] to the message shown to the user.
#[must_use]
pub fn error_message(error: &AuthError) -> &'static str {
    match error {
        AuthError::Rejected(code) => user_message(code),
        AuthError::Unavailable(_) => GENERIC_ERROR_MESSAGE,
    }
}

/// Whether the form signs in or registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Sign in to an existing account.
    #[default]
    SignIn,
    /// Create a new account.
    Register,
}

impl AuthMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::SignIn => Self::Register,
            Self::Register => Self::SignIn,
        }
    }

    /// Form heading / button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SignIn => "Login",
            Self::Register => "Register",
        }
    }

    /// Hint for switching to the other mode.
    #[must_use]
    pub const fn switch_hint(self) -> &'static str {
        match self {
            Self::SignIn => "Don't have an account? Register",
            Self::Register => "Already have an account? Login",
        }
    }
}

/// Form state of the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    /// Email as typed.
    pub email: String,
    /// Password as typed.
    pub password: String,
    /// Sign in or register.
    pub mode: AuthMode,
    /// Message from the last failed submission.
    pub error: Option<String>,
}

impl AuthForm {
    /// Flips between sign-in and registration.
    pub const fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

/// Login/registration gate in front of the board.
pub struct AuthGate<I> {
    identity: Arc<I>,
    form: AuthForm,
    session: Option<Session>,
}

impl<I: IdentityService> AuthGate<I> {
    /// Creates a gate with an empty sign-in form.
    pub fn new(identity: Arc<I>) -> Self {
        Self {
            identity,
            form: AuthForm::default(),
            session: None,
        }
    }

    /// Current form state.
    #[must_use]
    pub const fn form(&self) -> &AuthForm {
        &self.form
    }

    /// Mutable form state for input handling.
    pub const fn form_mut(&mut self) -> &mut AuthForm {
        &mut self.form
    }

    /// The established session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Submits the form once.
    ///
    /// Clears the previous error first. With an empty field nothing is sent.
    /// On failure the mapped message is stored in the form and `None` is
    /// returned.
    pub async fn submit(&mut self) -> Option<Session> {
        self.form.error = None;

        if !self.form.is_complete() {
            self.form.error = Some(MISSING_CREDENTIALS_MESSAGE.to_string());
            return None;
        }

        let mode = self.form.mode;
        let result = match mode {
            AuthMode::Register => {
                self.identity
                    .create_account(&self.form.email, &self.form.password)
                    .await
            }
            AuthMode::SignIn => {
                self.identity
                    .authenticate(&self.form.email, &self.form.password)
                    .await
            }
        };

        match result {
            Ok(session) => {
                tracing::info!(user_id = %session.user_id, ?mode, "authenticated");
                self.session = Some(session.clone());
                Some(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, ?mode, "authentication failed");
                self.form.error = Some(error_message(&e).to_string());
                None
            }
        }
    }
}
