//! Server core: shared state, WebSocket handler and request dispatch.
//!
//! Each connection gets an id, a writer task fed by an unbounded channel of
//! [`ServerMessage`]s, and a reader task that answers requests in the order
//! they arrive. Live query snapshots share the same channel, so a client
//! sees responses and snapshots in the order the server produced them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use stickywall_proto::auth::AuthErrorCode;
use stickywall_proto::wire::{self, ClientMessage, ServerMessage};
use tokio::sync::mpsc;

use crate::accounts::{Account, AccountRegistry};
use crate::documents::{DocumentError, DocumentRegistry};

/// Default largest accepted client frame in bytes (64 KB).
const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Shared server state.
pub struct ServerState {
    /// Registered accounts.
    pub accounts: AccountRegistry,
    /// Collections and their live queries.
    pub documents: DocumentRegistry,
    next_connection: AtomicU64,
    max_frame_size: usize,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    /// Creates empty state with the default frame limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Creates empty state with a custom frame limit.
    #[must_use]
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            accounts: AccountRegistry::new(),
            documents: DocumentRegistry::new(),
            next_connection: AtomicU64::new(1),
            max_frame_size,
        }
    }

    fn next_connection_id(&self) -> u64 {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }
}

/// Handles an upgraded WebSocket connection.
///
/// Runs until either side closes, then drops the connection's live queries.
pub async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    let connection = state.next_connection_id();
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    tracing::info!(connection, "client connected");

    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let bytes = match wire::encode_server(&msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(connection, error = %e, "failed to encode response");
                    continue;
                }
            };
            if ws_sender.send(Message::Binary(bytes.into())).await.is_err() {
                tracing::warn!(connection, "WebSocket write failed");
                break;
            }
        }
    });

    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Binary(data) => {
                    if data.len() > reader_state.max_frame_size {
                        tracing::warn!(
                            connection,
                            size = data.len(),
                            max = reader_state.max_frame_size,
                            "frame exceeds size limit, dropping"
                        );
                        continue;
                    }
                    match wire::decode_client(&data) {
                        Ok(request) => handle_request(connection, request, &reader_state, &tx).await,
                        Err(e) => {
                            tracing::warn!(connection, error = %e, "failed to decode frame");
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::info!(connection, "received close frame");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    let dropped = state.documents.drop_connection(connection).await;
    tracing::info!(connection, dropped, "client disconnected");
}

/// Answers one client request on `tx`.
async fn handle_request(
    connection: u64,
    request: ClientMessage,
    state: &ServerState,
    tx: &mpsc::UnboundedSender<ServerMessage>,
) {
    let response = match request {
        ClientMessage::CreateAccount {
            request_id,
            email,
            password,
        } => auth_response(request_id, state.accounts.register(&email, &password).await),
        ClientMessage::SignIn {
            request_id,
            email,
            password,
        } => auth_response(request_id, state.accounts.sign_in(&email, &password).await),
        ClientMessage::Subscribe {
            subscription_id,
            collection,
        } => {
            match state
                .documents
                .subscribe(connection, subscription_id, &collection, tx.clone())
                .await
            {
                Ok(()) => return,
                Err(e) => ServerMessage::SubscriptionFailed {
                    subscription_id,
                    reason: e.to_string(),
                },
            }
        }
        ClientMessage::Unsubscribe { subscription_id } => {
            state
                .documents
                .unsubscribe(connection, subscription_id)
                .await;
            return;
        }
        ClientMessage::Create {
            request_id,
            collection,
            task,
        } => match state.documents.create(&collection, task).await {
            Ok(id) => ServerMessage::Created { request_id, id },
            Err(e) => failed(request_id, e),
        },
        ClientMessage::Update {
            request_id,
            collection,
            id,
            patch,
        } => match state.documents.update(&collection, &id, &patch).await {
            Ok(()) => ServerMessage::Applied { request_id },
            Err(e) => failed(request_id, e),
        },
        ClientMessage::Delete {
            request_id,
            collection,
            id,
        } => match state.documents.delete(&collection, &id).await {
            Ok(()) => ServerMessage::Applied { request_id },
            Err(e) => failed(request_id, e),
        },
    };

    if tx.send(response).is_err() {
        tracing::debug!(connection, "connection gone before response");
    }
}

fn auth_response(
    request_id: u64,
    result: Result<Account, AuthErrorCode>,
) -> ServerMessage {
    match result {
        Ok(account) => ServerMessage::Authenticated {
            request_id,
            user_id: account.user_id,
            email: account.email,
        },
        Err(code) => {
            tracing::info!(request_id, code = %code, "authentication refused");
            ServerMessage::AuthFailed {
                request_id,
                code: code.as_code().to_string(),
            }
        }
    }
}

fn failed(request_id: u64, err: DocumentError) -> ServerMessage {
    tracing::warn!(request_id, error = %err, "document request failed");
    ServerMessage::Failed {
        request_id,
        failure: err.into(),
    }
}

/// Starts the server on the given address and returns the bound address
/// and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(ServerState::new())).await
}

/// Starts the server with pre-built [`ServerState`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
