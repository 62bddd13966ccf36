//! Integration tests for the auth gate.
//!
//! Validates the sign-in / registration flow against the in-process
//! identity service and the message shown for every identity error code.

use std::sync::Arc;

use stickywall::auth::memory::MemoryIdentity;
use stickywall::auth::{
    AuthError, AuthGate, AuthMode, GENERIC_ERROR_MESSAGE, IdentityService,
    MISSING_CREDENTIALS_MESSAGE, Session, error_message,
};
use stickywall_proto::auth::AuthErrorCode;

/// Identity double that fails every call with one error.
struct Failing(AuthError);

impl IdentityService for Failing {
    async fn create_account(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        Err(self.0.clone())
    }

    async fn authenticate(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        Err(self.0.clone())
    }
}

fn fill<I: IdentityService>(gate: &mut AuthGate<I>, email: &str, password: &str) {
    let form = gate.form_mut();
    form.email = email.to_string();
    form.password = password.to_string();
}

async fn message_for(error: AuthError) -> Option<String> {
    let mut gate = AuthGate::new(Arc::new(Failing(error)));
    fill(&mut gate, "ann@example.com", "secret");
    assert!(gate.submit().await.is_none());
    assert!(gate.session().is_none());
    gate.form().error.clone()
}

// =============================================================================
// Error messages
// =============================================================================

#[tokio::test]
async fn every_code_maps_to_its_message() {
    let cases = [
        (AuthErrorCode::EmailAlreadyInUse, "Email is already registered"),
        (AuthErrorCode::InvalidEmail, "Invalid email address"),
        (
            AuthErrorCode::WeakPassword,
            "Password should be at least 6 characters",
        ),
        (
            AuthErrorCode::WrongPassword,
            "Invalid email address or password",
        ),
        (
            AuthErrorCode::UserNotFound,
            "Invalid email address or password",
        ),
        (
            AuthErrorCode::InvalidCredentials,
            "Invalid email address or password",
        ),
        (
            AuthErrorCode::from_code("auth/too-many-requests"),
            GENERIC_ERROR_MESSAGE,
        ),
    ];

    for (code, expected) in cases {
        let shown = message_for(AuthError::Rejected(code.clone())).await;
        assert_eq!(shown.as_deref(), Some(expected), "code {code}");
    }
}

#[tokio::test]
async fn unreachable_service_shows_generic_message() {
    let shown = message_for(AuthError::Unavailable("connection refused".to_string())).await;
    assert_eq!(shown.as_deref(), Some(GENERIC_ERROR_MESSAGE));
    assert_eq!(
        error_message(&AuthError::Unavailable(String::new())),
        GENERIC_ERROR_MESSAGE
    );
}

// =============================================================================
// Flow against the in-process identity service
// =============================================================================

#[tokio::test]
async fn register_then_sign_in_on_a_fresh_gate() {
    let identity = Arc::new(MemoryIdentity::new());

    let mut register = AuthGate::new(Arc::clone(&identity));
    register.form_mut().toggle_mode();
    assert_eq!(register.form().mode, AuthMode::Register);
    fill(&mut register, "ann@example.com", "secret");
    let created = register.submit().await.expect("registration succeeds");
    assert_eq!(register.session(), Some(&created));
    assert_eq!(identity.account_count(), 1);

    let mut sign_in = AuthGate::new(Arc::clone(&identity));
    fill(&mut sign_in, "ann@example.com", "secret");
    let session = sign_in.submit().await.expect("sign-in succeeds");
    assert_eq!(session.user_id, created.user_id);
    assert!(sign_in.form().error.is_none());
}

#[tokio::test]
async fn wrong_password_then_retry() {
    let identity = Arc::new(MemoryIdentity::new());
    identity
        .create_account("ann@example.com", "secret")
        .await
        .unwrap();

    let mut gate = AuthGate::new(identity);
    fill(&mut gate, "ann@example.com", "wrong!");
    assert!(gate.submit().await.is_none());
    assert_eq!(
        gate.form().error.as_deref(),
        Some("Invalid email address or password")
    );

    gate.form_mut().password = "secret".to_string();
    assert!(gate.submit().await.is_some());
    assert!(gate.form().error.is_none());
}

#[tokio::test]
async fn duplicate_registration_is_reported() {
    let identity = Arc::new(MemoryIdentity::new());
    identity
        .create_account("ann@example.com", "secret")
        .await
        .unwrap();

    let mut gate = AuthGate::new(identity);
    gate.form_mut().toggle_mode();
    fill(&mut gate, "ann@example.com", "another");
    assert!(gate.submit().await.is_none());
    assert_eq!(
        gate.form().error.as_deref(),
        Some("Email is already registered")
    );
}

#[tokio::test]
async fn empty_fields_never_reach_the_service() {
    let identity = Arc::new(MemoryIdentity::new());
    let mut gate = AuthGate::new(Arc::clone(&identity));
    gate.form_mut().toggle_mode();
    fill(&mut gate, "ann@example.com", "");

    assert!(gate.submit().await.is_none());
    assert_eq!(
        gate.form().error.as_deref(),
        Some(MISSING_CREDENTIALS_MESSAGE)
    );
    assert_eq!(identity.account_count(), 0);
}
