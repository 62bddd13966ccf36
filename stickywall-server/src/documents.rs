//! Live document collections for the development server.
//!
//! Collections are created on first use and held in memory. Every
//! subscriber of a collection receives the full contents right after
//! subscribing and again after each successful change to it.

use std::collections::{BTreeMap, HashMap};

use stickywall_proto::task::{NewTask, Task, TaskId, TaskPatch};
use stickywall_proto::wire::{ServerMessage, StoreFailure};
use tokio::sync::{RwLock, mpsc};

/// Identifies one live query: connection id and the client's subscription id.
type SubscriberKey = (u64, u64);

/// Errors that can occur during document operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The addressed document does not exist.
    #[error("document {id} not found in {collection}")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Missing document id.
        id: TaskId,
    },
    /// The request violates a document rule.
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl From<DocumentError> for StoreFailure {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound { .. } => Self::NotFound,
            DocumentError::Invalid(reason) => Self::Rejected(reason),
        }
    }
}

struct Subscriber {
    collection: String,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<TaskId, Task>>,
    subscribers: HashMap<SubscriberKey, Subscriber>,
}

impl Inner {
    fn tasks(&self, collection: &str) -> Vec<Task> {
        self.collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Pushes the current contents of `collection` to its subscribers and
    /// forgets those whose connection is gone.
    fn broadcast(&mut self, collection: &str) {
        let tasks = self.tasks(collection);
        self.subscribers.retain(|&(_, subscription_id), sub| {
            if sub.collection != collection {
                return true;
            }
            sub.tx
                .send(ServerMessage::Snapshot {
                    subscription_id,
                    tasks: tasks.clone(),
                })
                .is_ok()
        });
    }
}

/// In-memory collections plus their live queries.
#[derive(Default)]
pub struct DocumentRegistry {
    inner: RwLock<Inner>,
}

impl DocumentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a live query and sends the first snapshot on `tx`.
    ///
    /// Re-using a subscription id on the same connection replaces the
    /// earlier query.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Invalid`] for an empty collection name.
    pub async fn subscribe(
        &self,
        connection: u64,
        subscription_id: u64,
        collection: &str,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<(), DocumentError> {
        check_collection(collection)?;
        let mut inner = self.inner.write().await;
        let tasks = inner.tasks(collection);
        // Sent under the lock so no broadcast can overtake the first snapshot.
        let _ = tx.send(ServerMessage::Snapshot {
            subscription_id,
            tasks,
        });
        inner.subscribers.insert(
            (connection, subscription_id),
            Subscriber {
                collection: collection.to_string(),
                tx,
            },
        );
        tracing::debug!(connection, subscription_id, collection, "subscribed");
        Ok(())
    }

    /// Stops one live query. Returns whether it existed.
    pub async fn unsubscribe(&self, connection: u64, subscription_id: u64) -> bool {
        let removed = self
            .inner
            .write()
            .await
            .subscribers
            .remove(&(connection, subscription_id))
            .is_some();
        tracing::debug!(connection, subscription_id, removed, "unsubscribed");
        removed
    }

    /// Stops every live query of a connection. Returns how many there were.
    pub async fn drop_connection(&self, connection: u64) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.subscribers.len();
        inner.subscribers.retain(|&(conn, _), _| conn != connection);
        before - inner.subscribers.len()
    }

    /// Number of live queries across all connections.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.read().await.subscribers.len()
    }

    /// Current contents of a collection.
    pub async fn documents(&self, collection: &str) -> Vec<Task> {
        self.inner.read().await.tasks(collection)
    }

    /// Inserts a document under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Invalid`] for an empty collection name or
    /// a blank title.
    pub async fn create(&self, collection: &str, task: NewTask) -> Result<TaskId, DocumentError> {
        check_collection(collection)?;
        if task.title.trim().is_empty() {
            return Err(DocumentError::Invalid("title is required".to_string()));
        }

        let id = TaskId::generate();
        let mut inner = self.inner.write().await;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), Task::from_new(id.clone(), task));
        inner.broadcast(collection);
        tracing::info!(collection, task_id = %id, "document created");
        Ok(id)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if there is no such document.
    pub async fn update(
        &self,
        collection: &str,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<(), DocumentError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| not_found(collection, id))?;
        patch.apply_to(task);
        inner.broadcast(collection);
        tracing::debug!(collection, task_id = %id, "document updated");
        Ok(())
    }

    /// Removes a document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if there is no such document.
    pub async fn delete(&self, collection: &str, id: &TaskId) -> Result<(), DocumentError> {
        let mut inner = self.inner.write().await;
        inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .ok_or_else(|| not_found(collection, id))?;
        inner.broadcast(collection);
        tracing::info!(collection, task_id = %id, "document deleted");
        Ok(())
    }
}

fn check_collection(collection: &str) -> Result<(), DocumentError> {
    if collection.trim().is_empty() {
        return Err(DocumentError::Invalid(
            "collection name is required".to_string(),
        ));
    }
    Ok(())
}

fn not_found(collection: &str, id: &TaskId) -> DocumentError {
    DocumentError::NotFound {
        collection: collection.to_string(),
        id: id.clone(),
    }
}
