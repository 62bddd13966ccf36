//! WebSocket connection to a `stickywall-server`.
//!
//! [`RemoteBackend`] implements both [`IdentityService`] and
//! [`DocumentStore`] over a single WebSocket. Requests are correlated by a
//! client-chosen `request_id`; live queries by a `subscription_id` that the
//! server stamps on every snapshot it pushes.
//!
//! A background writer task owns the sink and a background reader task
//! dispatches incoming frames. When the connection drops, every waiting
//! request fails with [`StoreError::ConnectionClosed`] and every live query
//! ends with [`StoreError::SubscriptionClosed`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use stickywall_proto::auth::AuthErrorCode;
use stickywall_proto::task::{NewTask, Snapshot, TaskId, TaskPatch};
use stickywall_proto::wire::{self, ClientMessage, ServerMessage, StoreFailure};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::auth::{AuthError, IdentityService, Session};
use crate::store::{DocumentStore, SnapshotResult, StoreError, Subscription, SubscriptionId};

/// Write half of the WebSocket connection.
type WsSink =
    futures_util::stream::SplitSink<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>, Message>;

/// Read half of the WebSocket connection.
type WsReader =
    futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Errors establishing the connection.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The WebSocket handshake did not finish in time.
    #[error("connecting to {url} timed out")]
    Timeout {
        /// Backend URL.
        url: String,
    },
    /// The WebSocket handshake failed.
    #[error("connecting to {url} failed: {reason}")]
    Connect {
        /// Backend URL.
        url: String,
        /// What went wrong.
        reason: String,
    },
}

/// State shared between the backend handle and its reader task.
#[derive(Default)]
struct Shared {
    /// Requests waiting for their response, by `request_id`.
    pending: Mutex<HashMap<u64, oneshot::Sender<ServerMessage>>>,
    /// Live queries, by `subscription_id`.
    listeners: Mutex<HashMap<u64, mpsc::UnboundedSender<SnapshotResult>>>,
    connected: AtomicBool,
}

impl Shared {
    /// Marks the connection dead and fails everything still waiting on it.
    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let pending = std::mem::take(&mut *self.pending.lock());
        let listeners = std::mem::take(&mut *self.listeners.lock());
        if !pending.is_empty() || !listeners.is_empty() {
            tracing::warn!(
                pending = pending.len(),
                listeners = listeners.len(),
                "backend connection lost"
            );
        }
    }

    /// Registers a live query.
    ///
    /// `close` flips `connected` before it empties `listeners`, so a
    /// listener registered after that point is caught and removed here.
    fn register_listener(
        &self,
        subscription_id: u64,
        tx: mpsc::UnboundedSender<SnapshotResult>,
    ) -> Result<(), StoreError> {
        self.listeners.lock().insert(subscription_id, tx);
        if !self.connected.load(Ordering::SeqCst) {
            self.listeners.lock().remove(&subscription_id);
            return Err(StoreError::ConnectionClosed);
        }
        Ok(())
    }

    fn dispatch(&self, msg: ServerMessage) {
        match msg {
            ServerMessage::Snapshot {
                subscription_id,
                tasks,
            } => {
                let mut listeners = self.listeners.lock();
                let delivered = listeners
                    .get(&subscription_id)
                    .is_some_and(|tx| tx.send(Ok(Snapshot::new(tasks))).is_ok());
                if !delivered {
                    listeners.remove(&subscription_id);
                }
            }
            ServerMessage::SubscriptionFailed {
                subscription_id,
                reason,
            } => {
                tracing::warn!(subscription_id, reason = %reason, "live query refused");
                if let Some(tx) = self.listeners.lock().remove(&subscription_id) {
                    let _ = tx.send(Err(StoreError::Unavailable(reason)));
                }
            }
            other => {
                let Some(request_id) = other.request_id() else {
                    return;
                };
                match self.pending.lock().remove(&request_id) {
                    Some(tx) => {
                        let _ = tx.send(other);
                    }
                    None => tracing::debug!(request_id, "response for unknown request"),
                }
            }
        }
    }
}

/// Client side of the Sticky Wall wire protocol.
pub struct RemoteBackend {
    url: String,
    outgoing: mpsc::UnboundedSender<Message>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    reader_handle: tokio::task::JoinHandle<()>,
}

impl RemoteBackend {
    /// Opens a WebSocket to `url` and starts the background tasks.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Timeout`] if the handshake takes longer than
    /// `connect_timeout`, or [`RemoteError::Connect`] if it fails.
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, RemoteError> {
        let (ws_stream, _response) = tokio::time::timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                tracing::warn!(url, "backend connect timed out");
                RemoteError::Timeout {
                    url: url.to_string(),
                }
            })?
            .map_err(|e| {
                tracing::warn!(url, err = %e, "backend connect failed");
                RemoteError::Connect {
                    url: url.to_string(),
                    reason: describe_connect_error(&e),
                }
            })?;

        let (sink, reader) = ws_stream.split();
        let shared = Arc::new(Shared {
            connected: AtomicBool::new(true),
            ..Shared::default()
        });
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();

        tokio::spawn(writer_loop(sink, outgoing_rx, Arc::clone(&shared)));
        let reader_handle = tokio::spawn(reader_loop(reader, Arc::clone(&shared)));

        tracing::info!(url, "connected to backend");
        Ok(Self {
            url: url.to_string(),
            outgoing,
            shared,
            next_id: AtomicU64::new(1),
            reader_handle,
        })
    }

    /// The backend URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the connection is still up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Number of live queries this client holds.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn send(&self, msg: &ClientMessage) -> Result<(), StoreError> {
        let bytes = wire::encode_client(msg).map_err(|e| StoreError::Rejected(e.to_string()))?;
        self.outgoing
            .send(Message::Binary(bytes.into()))
            .map_err(|_| StoreError::ConnectionClosed)
    }

    /// Sends a request and waits for the response carrying its id.
    async fn request(
        &self,
        build: impl FnOnce(u64) -> ClientMessage,
    ) -> Result<ServerMessage, StoreError> {
        let request_id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(request_id, tx);

        // The reader clears `pending` after flipping `connected`, so a
        // request registered after that point is caught here.
        if !self.is_connected() {
            self.shared.pending.lock().remove(&request_id);
            return Err(StoreError::ConnectionClosed);
        }
        if let Err(e) = self.send(&build(request_id)) {
            self.shared.pending.lock().remove(&request_id);
            return Err(e);
        }

        rx.await.map_err(|_| StoreError::ConnectionClosed)
    }

    async fn sign_in(
        &self,
        build: impl FnOnce(u64) -> ClientMessage,
    ) -> Result<Session, AuthError> {
        let response = self
            .request(build)
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;
        match response {
            ServerMessage::Authenticated { user_id, email, .. } => Ok(Session { user_id, email }),
            ServerMessage::AuthFailed { code, .. } => {
                Err(AuthError::Rejected(AuthErrorCode::from_code(&code)))
            }
            other => {
                tracing::warn!(?other, "unexpected response to sign-in");
                Err(AuthError::Unavailable("unexpected response".to_string()))
            }
        }
    }

    /// Detaches a live query locally and tells the server to stop it.
    fn release(shared: &Weak<Shared>, outgoing: &mpsc::UnboundedSender<Message>, id: u64) {
        if let Some(shared) = shared.upgrade() {
            shared.listeners.lock().remove(&id);
        }
        let msg = ClientMessage::Unsubscribe {
            subscription_id: id,
        };
        if let Ok(bytes) = wire::encode_client(&msg) {
            // A closed connection has no server-side query left to stop.
            let _ = outgoing.send(Message::Binary(bytes.into()));
        }
    }
}

impl Drop for RemoteBackend {
    fn drop(&mut self) {
        self.reader_handle.abort();
        self.shared.close();
    }
}

impl IdentityService for RemoteBackend {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.sign_in(|request_id| ClientMessage::CreateAccount {
            request_id,
            email: email.to_string(),
            password: password.to_string(),
        })
        .await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.sign_in(|request_id| ClientMessage::SignIn {
            request_id,
            email: email.to_string(),
            password: password.to_string(),
        })
        .await
    }
}

impl DocumentStore for RemoteBackend {
    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let subscription_id = self.next_id();
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.register_listener(subscription_id, tx)?;

        let msg = ClientMessage::Subscribe {
            subscription_id,
            collection: collection.to_string(),
        };
        if let Err(e) = self.send(&msg) {
            self.shared.listeners.lock().remove(&subscription_id);
            return Err(e);
        }
        tracing::debug!(subscription_id, collection, "live query requested");

        let shared = Arc::downgrade(&self.shared);
        let outgoing = self.outgoing.clone();
        Ok(Subscription::new(
            SubscriptionId(subscription_id),
            rx,
            move || Self::release(&shared, &outgoing, subscription_id),
        ))
    }

    async fn create(&self, collection: &str, task: NewTask) -> Result<TaskId, StoreError> {
        let response = self
            .request(|request_id| ClientMessage::Create {
                request_id,
                collection: collection.to_string(),
                task,
            })
            .await?;
        match response {
            ServerMessage::Created { id, .. } => Ok(id),
            other => Err(failure_to_error(other, collection, None)),
        }
    }

    async fn update(
        &self,
        collection: &str,
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<(), StoreError> {
        let response = self
            .request(|request_id| ClientMessage::Update {
                request_id,
                collection: collection.to_string(),
                id: id.clone(),
                patch,
            })
            .await?;
        match response {
            ServerMessage::Applied { .. } => Ok(()),
            other => Err(failure_to_error(other, collection, Some(id))),
        }
    }

    async fn delete(&self, collection: &str, id: &TaskId) -> Result<(), StoreError> {
        let response = self
            .request(|request_id| ClientMessage::Delete {
                request_id,
                collection: collection.to_string(),
                id: id.clone(),
            })
            .await?;
        match response {
            ServerMessage::Applied { .. } => Ok(()),
            other => Err(failure_to_error(other, collection, Some(id))),
        }
    }
}

/// Maps a non-success response to a [`StoreError`].
fn failure_to_error(msg: ServerMessage, collection: &str, id: Option<&TaskId>) -> StoreError {
    match msg {
        ServerMessage::Failed {
            failure: StoreFailure::NotFound,
            ..
        } => StoreError::NotFound {
            collection: collection.to_string(),
            id: id.cloned().unwrap_or_else(|| TaskId::new("")),
        },
        ServerMessage::Failed {
            failure: StoreFailure::Rejected(reason),
            ..
        } => StoreError::Rejected(reason),
        other => {
            tracing::warn!(?other, "unexpected response to document request");
            StoreError::Rejected("unexpected response".to_string())
        }
    }
}

/// Forwards queued frames to the socket until the handle goes away.
async fn writer_loop(
    mut sink: WsSink,
    mut outgoing: mpsc::UnboundedReceiver<Message>,
    shared: Arc<Shared>,
) {
    while let Some(msg) = outgoing.recv().await {
        if let Err(e) = sink.send(msg).await {
            tracing::warn!(err = %e, "backend send failed");
            shared.close();
            return;
        }
    }
    let _ = sink.close().await;
    tracing::debug!("backend writer task exiting");
}

/// Reads frames and routes them to waiting requests and live queries.
///
/// Malformed frames are logged and skipped. When the socket closes or
/// errors out, the connection is marked dead.
async fn reader_loop(mut reader: WsReader, shared: Arc<Shared>) {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(Message::Binary(data)) => match wire::decode_server(&data) {
                Ok(msg) => shared.dispatch(msg),
                Err(e) => tracing::warn!(err = %e, "malformed backend frame, skipping"),
            },
            Ok(Message::Close(_)) => {
                tracing::info!("backend closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(err = %e, "backend read error");
                break;
            }
        }
    }
    shared.close();
    tracing::info!("backend reader task exiting");
}

/// Short description of a handshake failure.
fn describe_connect_error(err: &tokio_tungstenite::tungstenite::Error) -> String {
    use tokio_tungstenite::tungstenite::Error as WsError;
    match err {
        WsError::Io(io_err) if io_err.kind() == std::io::ErrorKind::ConnectionRefused => {
            "connection refused".to_string()
        }
        WsError::Http(response) => format!("HTTP status {}", response.status()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite as ws;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Accepts one connection, answers the first subscribe with an empty
    /// snapshot, then closes.
    async fn start_closing_server() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("ws://{addr}/ws");

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws_stream = tokio_tungstenite::accept_async(stream).await.unwrap();

            let frame = ws_stream.next().await;
            if let Some(Ok(ws::Message::Binary(data))) = frame {
                let Ok(ClientMessage::Subscribe {
                    subscription_id, ..
                }) = wire::decode_client(&data)
                else {
                    panic!("expected a subscribe frame");
                };
                let reply = ServerMessage::Snapshot {
                    subscription_id,
                    tasks: Vec::new(),
                };
                let bytes = wire::encode_server(&reply).unwrap();
                let _ = ws_stream.send(ws::Message::Binary(bytes.into())).await;
            }

            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = ws_stream.close(None).await;
        });

        (url, handle)
    }

    #[tokio::test]
    async fn connect_refused_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = RemoteBackend::connect(&format!("ws://{addr}/ws"), TIMEOUT).await;
        assert!(matches!(result, Err(RemoteError::Connect { .. })));
    }

    #[tokio::test]
    async fn server_close_ends_subscription_and_requests() {
        let (url, handle) = start_closing_server().await;
        let backend = RemoteBackend::connect(&url, TIMEOUT).await.unwrap();
        assert_eq!(backend.url(), url);
        assert!(backend.is_connected());

        let mut sub = backend.subscribe("tasks").await.unwrap();
        let first = tokio::time::timeout(TIMEOUT, sub.next()).await.unwrap();
        assert_eq!(first, Some(Ok(Snapshot::default())));

        let end = tokio::time::timeout(TIMEOUT, sub.next()).await.unwrap();
        assert_eq!(end, None);
        handle.await.unwrap();

        assert!(!backend.is_connected());
        let err = backend
            .delete("tasks", &TaskId::new("a"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::ConnectionClosed);
        assert!(matches!(
            backend.authenticate("ann@example.com", "secret").await,
            Err(AuthError::Unavailable(_))
        ));
    }

    #[test]
    fn listener_registered_after_close_is_dropped() {
        let shared = Shared {
            connected: AtomicBool::new(true),
            ..Shared::default()
        };
        let (tx, _rx) = mpsc::unbounded_channel();
        shared.register_listener(1, tx).unwrap();
        assert_eq!(shared.listeners.lock().len(), 1);

        shared.close();
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert_eq!(
            shared.register_listener(2, tx),
            Err(StoreError::ConnectionClosed)
        );
        assert!(shared.listeners.lock().is_empty());
        // The sender is gone, so a receiver would see the query end.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn subscribe_after_server_close_fails() {
        let (url, handle) = start_closing_server().await;
        let backend = RemoteBackend::connect(&url, TIMEOUT).await.unwrap();
        let mut sub = backend.subscribe("tasks").await.unwrap();
        tokio::time::timeout(TIMEOUT, sub.next()).await.unwrap();
        tokio::time::timeout(TIMEOUT, sub.next()).await.unwrap();
        handle.await.unwrap();

        assert_eq!(
            backend.subscribe("tasks").await.unwrap_err(),
            StoreError::ConnectionClosed
        );
        assert_eq!(backend.listener_count(), 0);
    }

    #[test]
    fn failures_map_to_store_errors() {
        let id = TaskId::new("t1");
        let not_found = ServerMessage::Failed {
            request_id: 1,
            failure: StoreFailure::NotFound,
        };
        assert_eq!(
            failure_to_error(not_found, "tasks", Some(&id)),
            StoreError::NotFound {
                collection: "tasks".to_string(),
                id,
            }
        );
        let rejected = ServerMessage::Failed {
            request_id: 2,
            failure: StoreFailure::Rejected("title is required".to_string()),
        };
        assert_eq!(
            failure_to_error(rejected, "tasks", None),
            StoreError::Rejected("title is required".to_string())
        );
    }
}
