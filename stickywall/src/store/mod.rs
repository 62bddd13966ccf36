//! Document store abstraction.
//!
//! Defines the [`DocumentStore`] trait the board talks to and the
//! [`Subscription`] handle for live collection queries. Implementations:
//! - [`memory::MemoryStore`]: in-process store for offline use and tests
//! - [`crate::remote::RemoteBackend`]: WebSocket connection to a
//!   `stickywall-server`

pub mod memory;

use std::fmt;

use stickywall_proto::task::{NewTask, Snapshot, TaskId, TaskPatch};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Errors reported by a document store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("document {id} not found in {collection}")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Missing document id.
        id: TaskId,
    },

    /// The store refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The store cannot be reached right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The connection to the store went away before a response arrived.
    #[error("connection to store closed")]
    ConnectionClosed,

    /// The live query stopped delivering snapshots.
    #[error("subscription closed")]
    SubscriptionClosed,
}

/// Identifier of one live query, unique per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Item delivered on a live query.
pub type SnapshotResult = Result<Snapshot, StoreError>;

/// A live query over one collection.
///
/// Snapshots arrive in the order the store produced them. The listener is
/// released exactly once: by [`Subscription::unsubscribe`], or when the
/// handle is dropped.
pub struct Subscription {
    id: SubscriptionId,
    snapshots: mpsc::UnboundedReceiver<SnapshotResult>,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
    closed: bool,
}

impl Subscription {
    /// Wraps a snapshot channel and the hook that detaches the listener.
    pub fn new(
        id: SubscriptionId,
        snapshots: mpsc::UnboundedReceiver<SnapshotResult>,
        release: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            snapshots,
            release: Some(Box::new(release)),
            closed: false,
        }
    }

    /// Identifier of this live query.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `None` once the store has dropped its side of the channel.
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        let item = self.snapshots.recv().await;
        if item.is_none() {
            self.closed = true;
        }
        item
    }

    /// Takes the next pending snapshot without waiting.
    ///
    /// When the store side has gone away this yields
    /// [`StoreError::SubscriptionClosed`] once, then `None`.
    pub fn try_next(&mut self) -> Option<SnapshotResult> {
        match self.snapshots.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if self.closed {
                    None
                } else {
                    self.closed = true;
                    Some(Err(StoreError::SubscriptionClosed))
                }
            }
        }
    }

    /// Detaches the listener from the store.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::debug!(subscription = %self.id, "releasing live query");
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("released", &self.release.is_none())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Async interface to a real-time document store.
///
/// Every mutation is a single request; the store alone decides ordering, and
/// the effect of a mutation reaches readers only through the next snapshot
/// of their subscription.
pub trait DocumentStore: Send + Sync {
    /// Starts a live query over an entire collection.
    ///
    /// The first snapshot reflects the collection as it is now; a new full
    /// snapshot follows every change.
    fn subscribe(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<Subscription, StoreError>> + Send;

    /// Inserts a document and returns the id the store assigned.
    fn create(
        &self,
        collection: &str,
        task: NewTask,
    ) -> impl std::future::Future<Output = Result<TaskId, StoreError>> + Send;

    /// Replaces the fields present in `patch` on one document.
    fn update(
        &self,
        collection: &str,
        id: &TaskId,
        patch: TaskPatch,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Removes one document.
    fn delete(
        &self,
        collection: &str,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
