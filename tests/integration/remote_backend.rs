//! Integration tests for the WebSocket backend.
//!
//! Starts `stickywall-server` in-process and drives it through
//! `RemoteBackend`:
//! - Registration and sign-in error codes survive the round trip
//! - Live queries deliver changes made by another client
//! - Unsubscribing stops the query on the server too

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use stickywall::auth::{AuthError, AuthGate, IdentityService};
use stickywall::board::{Board, BoardError};
use stickywall::remote::{RemoteBackend, RemoteError};
use stickywall::store::{DocumentStore, StoreError};
use stickywall_proto::auth::AuthErrorCode;
use stickywall_proto::task::{TASKS_COLLECTION, TaskId, TaskPatch};
use stickywall_server::server::{ServerState, start_server_with_state};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the server in-process and return its ws:// URL and state.
async fn start_backend() -> (String, Arc<ServerState>) {
    let state = Arc::new(ServerState::new());
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start server");
    (format!("ws://{addr}/ws"), state)
}

async fn connect(url: &str) -> Arc<RemoteBackend> {
    Arc::new(
        RemoteBackend::connect(url, CONNECT_TIMEOUT)
            .await
            .expect("failed to connect"),
    )
}

fn board(backend: &Arc<RemoteBackend>) -> Board<RemoteBackend> {
    Board::with_rng(Arc::clone(backend), StdRng::seed_from_u64(1))
}

async fn settle(board: &mut Board<RemoteBackend>) {
    tokio::time::timeout(Duration::from_secs(5), board.next_snapshot())
        .await
        .expect("snapshot timed out")
        .unwrap();
}

/// Waits until `check` holds, polling for up to a second.
async fn eventually(mut check: impl AsyncFnMut() -> bool) -> bool {
    for _ in 0..50 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn register_and_sign_in_over_websocket() {
    let (url, state) = start_backend().await;
    let backend = connect(&url).await;

    let created = backend
        .create_account("ann@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(created.email, "ann@example.com");
    assert_eq!(state.accounts.len().await, 1);

    let session = backend
        .authenticate("ann@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(session.user_id, created.user_id);
}

#[tokio::test]
async fn identity_error_codes_survive_the_wire() {
    let (url, _state) = start_backend().await;
    let backend = connect(&url).await;
    backend
        .create_account("ann@example.com", "secret")
        .await
        .unwrap();

    assert_eq!(
        backend.create_account("ann@example.com", "secret").await,
        Err(AuthError::Rejected(AuthErrorCode::EmailAlreadyInUse))
    );
    assert_eq!(
        backend.create_account("bob@example.com", "123").await,
        Err(AuthError::Rejected(AuthErrorCode::WeakPassword))
    );
    assert_eq!(
        backend.authenticate("ann@example.com", "nope!!").await,
        Err(AuthError::Rejected(AuthErrorCode::InvalidCredentials))
    );
    assert_eq!(
        backend.authenticate("not-an-email", "secret").await,
        Err(AuthError::Rejected(AuthErrorCode::InvalidEmail))
    );
}

#[tokio::test]
async fn gate_shows_message_for_server_code() {
    let (url, _state) = start_backend().await;
    let backend = connect(&url).await;

    let mut gate = AuthGate::new(backend);
    gate.form_mut().email = "ann@example.com".to_string();
    gate.form_mut().password = "secret".to_string();
    assert!(gate.submit().await.is_none());
    assert_eq!(
        gate.form().error.as_deref(),
        Some("Invalid email address or password")
    );
}

// =============================================================================
// Live board
// =============================================================================

#[tokio::test]
async fn changes_from_one_client_reach_the_other() {
    let (url, _state) = start_backend().await;
    let alice_conn = connect(&url).await;
    let bob_conn = connect(&url).await;

    let mut alice = board(&alice_conn);
    let mut bob = board(&bob_conn);
    alice.activate().await.unwrap();
    bob.activate().await.unwrap();
    settle(&mut alice).await;
    settle(&mut bob).await;

    alice.draft_mut().title = "Buy milk".to_string();
    let id = alice.create_task().await.unwrap().expect("task id");

    settle(&mut bob).await;
    let seen = bob.state().task(&id).expect("task reached bob");
    assert_eq!(seen.title, "Buy milk");

    bob.toggle_completed(&id, false).await.unwrap();
    settle(&mut alice).await;
    settle(&mut alice).await;
    assert!(alice.state().task(&id).unwrap().completed);
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let (url, _state) = start_backend().await;
    let backend = connect(&url).await;
    let ghost = TaskId::new("ghost");

    let result = backend
        .update(TASKS_COLLECTION, &ghost, TaskPatch::completed(true))
        .await;
    assert!(matches!(result, Err(StoreError::NotFound { id, .. }) if id == ghost));

    let board = board(&backend);
    assert!(matches!(
        board.delete_task(&ghost).await,
        Err(BoardError::Store(StoreError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn deactivate_stops_server_side_query() {
    let (url, state) = start_backend().await;
    let backend = connect(&url).await;
    let mut board = board(&backend);

    board.activate().await.unwrap();
    settle(&mut board).await;
    assert_eq!(backend.listener_count(), 1);
    assert_eq!(state.documents.subscriber_count().await, 1);

    board.deactivate();
    assert_eq!(backend.listener_count(), 0);
    assert!(eventually(async || state.documents.subscriber_count().await == 0).await);
}

#[tokio::test]
async fn sort_switch_keeps_one_server_query() {
    let (url, state) = start_backend().await;
    let backend = connect(&url).await;
    let mut board = board(&backend);

    board.activate().await.unwrap();
    settle(&mut board).await;
    board
        .set_sort_order(stickywall::board::SortOrder::Descending)
        .await
        .unwrap();
    settle(&mut board).await;

    assert_eq!(backend.listener_count(), 1);
    assert!(eventually(async || state.documents.subscriber_count().await == 1).await);
}

// =============================================================================
// Connection failures
// =============================================================================

#[tokio::test]
async fn connect_to_closed_port_fails() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = RemoteBackend::connect(&format!("ws://{addr}/ws"), CONNECT_TIMEOUT).await;
    assert!(matches!(result, Err(RemoteError::Connect { .. })));
}
