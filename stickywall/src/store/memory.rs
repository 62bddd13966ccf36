//! In-process document store.
//!
//! Keeps every collection in memory and pushes a full snapshot to each
//! listener of a collection after every successful change. Used for the
//! offline mode of the binary and as the store double in tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use stickywall_proto::task::{NewTask, Snapshot, Task, TaskId, TaskPatch};
use tokio::sync::mpsc;

use super::{DocumentStore, SnapshotResult, StoreError, Subscription, SubscriptionId};

/// A registered live query.
struct Listener {
    collection: String,
    tx: mpsc::UnboundedSender<SnapshotResult>,
}

#[derive(Default)]
struct Inner {
    /// Collection name -> documents keyed by id.
    collections: HashMap<String, BTreeMap<TaskId, Task>>,
    /// Live queries by id.
    listeners: HashMap<SubscriptionId, Listener>,
    next_subscription: u64,
    /// When set, every request fails with [`StoreError::Unavailable`].
    unavailable: Option<String>,
    /// Number of create requests received, successful or not.
    create_requests: usize,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        match &self.unavailable {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn snapshot(&self, collection: &str) -> Snapshot {
        let tasks = self
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        Snapshot::new(tasks)
    }

    /// Sends the current contents to every listener of `collection`,
    /// forgetting listeners whose receiver is gone.
    fn publish(&mut self, collection: &str) {
        let snapshot = self.snapshot(collection);
        self.listeners.retain(|id, listener| {
            if listener.collection != collection {
                return true;
            }
            let alive = listener.tx.send(Ok(snapshot.clone())).is_ok();
            if !alive {
                tracing::debug!(subscription = %id, "dropping listener with closed receiver");
            }
            alive
        });
    }
}

/// In-memory [`DocumentStore`].
///
/// Cloning yields another handle to the same data, so several boards can
/// watch one collection the way separate sessions would.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of listeners currently attached, across all collections.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Number of create requests received so far.
    #[must_use]
    pub fn create_requests(&self) -> usize {
        self.inner.lock().create_requests
    }

    /// Current contents of a collection.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Snapshot {
        self.inner.lock().snapshot(collection)
    }

    /// Makes every request fail with [`StoreError::Unavailable`] until
    /// [`set_available`](Self::set_available) is called.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        self.inner.lock().unavailable = Some(reason.into());
    }

    /// Lifts a previous [`set_unavailable`](Self::set_unavailable).
    pub fn set_available(&self) {
        self.inner.lock().unavailable = None;
    }

    fn detach(inner: &Weak<Mutex<Inner>>, id: SubscriptionId) {
        if let Some(inner) = inner.upgrade() {
            let removed = inner.lock().listeners.remove(&id).is_some();
            tracing::debug!(subscription = %id, removed, "listener detached");
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.inner.lock();
            inner.check_available()?;
            inner.next_subscription += 1;
            let id = SubscriptionId(inner.next_subscription);
            // Initial snapshot goes out before the listener is visible to
            // writers, so it is always the first item.
            let _ = tx.send(Ok(inner.snapshot(collection)));
            inner.listeners.insert(
                id,
                Listener {
                    collection: collection.to_string(),
                    tx,
                },
            );
            id
        };
        tracing::debug!(subscription = %id, collection, "listener attached");

        let weak = Arc::downgrade(&self.inner);
        Ok(Subscription::new(id, rx, move || Self::detach(&weak, id)))
    }

    async fn create(&self, collection: &str, task: NewTask) -> Result<TaskId, StoreError> {
        let mut inner = self.inner.lock();
        inner.create_requests += 1;
        inner.check_available()?;
        if task.title.trim().is_empty() {
            return Err(StoreError::Rejected("title must not be empty".to_string()));
        }

        let id = TaskId::generate();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), Task::from_new(id.clone(), task));
        inner.publish(collection);
        drop(inner);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        let task = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            })?;
        patch.apply_to(task);
        inner.publish(collection);
        drop(inner);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.check_available()?;
        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if removed.is_none() {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            });
        }
        inner.publish(collection);
        drop(inner);
        Ok(())
    }
}
