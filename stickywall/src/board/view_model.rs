//! Store-backed board: subscription lifecycle and mutations.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stickywall_proto::task::{PALETTE, TASKS_COLLECTION, TaskColor, TaskId, TaskPatch};

use super::BoardError;
use super::state::{ActiveView, BoardState, Draft, SortOrder};
use crate::store::{DocumentStore, StoreError, Subscription, SubscriptionId};

/// The task board bound to a document store.
///
/// Holds at most one live subscription. It is acquired by
/// [`activate`](Self::activate), replaced on every sort-order change, and
/// released by [`deactivate`](Self::deactivate) or when the board is dropped.
pub struct Board<S> {
    store: Arc<S>,
    collection: String,
    state: BoardState,
    subscription: Option<Subscription>,
    rng: StdRng,
}

impl<S: DocumentStore> Board<S> {
    /// Creates an inactive board over the `tasks` collection.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_rng(store, StdRng::from_os_rng())
    }

    /// Creates an inactive board that draws note colors from `rng`.
    pub fn with_rng(store: Arc<S>, rng: StdRng) -> Self {
        Self {
            store,
            collection: TASKS_COLLECTION.to_string(),
            state: BoardState::default(),
            subscription: None,
            rng,
        }
    }

    /// Sets the initial sort order.
    #[must_use]
    pub fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.state.set_sort_order(order);
        self
    }

    /// Current local state.
    #[must_use]
    pub const fn state(&self) -> &BoardState {
        &self.state
    }

    /// The task draft, for input handling.
    pub const fn draft_mut(&mut self) -> &mut Draft {
        &mut self.state.draft
    }

    /// Whether a live subscription is held.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Id of the live subscription, if any.
    #[must_use]
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.subscription.as_ref().map(Subscription::id)
    }

    /// Starts listening to the collection.
    ///
    /// Any existing subscription is released first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Store`] if the store refuses the subscription;
    /// the board is then inactive.
    pub async fn activate(&mut self) -> Result<(), BoardError> {
        self.release();
        match self.store.subscribe(&self.collection).await {
            Ok(subscription) => {
                tracing::info!(
                    subscription = %subscription.id(),
                    collection = %self.collection,
                    "board subscribed"
                );
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, collection = %self.collection, "subscribe failed");
                Err(e.into())
            }
        }
    }

    /// Stops listening. Does nothing when already inactive.
    pub fn deactivate(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            tracing::info!(subscription = %subscription.id(), "board unsubscribed");
            subscription.unsubscribe();
        }
    }

    /// Changes the title ordering.
    ///
    /// The local list is re-sorted at once. An active board swaps its
    /// subscription for a fresh one so the listener always matches the
    /// current criterion.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Store`] if re-subscribing fails.
    pub async fn set_sort_order(&mut self, order: SortOrder) -> Result<(), BoardError> {
        if !self.state.set_sort_order(order) {
            return Ok(());
        }
        tracing::debug!(?order, "sort order changed");
        if self.is_active() {
            self.activate().await?;
        }
        Ok(())
    }

    /// Changes the view filter.
    pub fn set_active_view(&mut self, view: ActiveView) {
        tracing::debug!(?view, "view changed");
        self.state.set_active_view(view);
    }

    /// Applies every snapshot already delivered, without waiting.
    ///
    /// Returns the number of snapshots applied. A failed or closed
    /// subscription is logged and dropped.
    pub fn poll_snapshots(&mut self) -> usize {
        let mut applied = 0;
        let mut failed = false;
        if let Some(subscription) = self.subscription.as_mut() {
            while let Some(item) = subscription.try_next() {
                match item {
                    Ok(snapshot) => {
                        self.state.apply_snapshot(snapshot);
                        applied += 1;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "task subscription failed");
                        failed = true;
                        break;
                    }
                }
            }
        }
        if failed {
            self.release();
        }
        applied
    }

    /// Waits for the next snapshot and applies it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotSubscribed`] when inactive, or
    /// [`BoardError::Store`] if the subscription reports an error or closes.
    pub async fn next_snapshot(&mut self) -> Result<(), BoardError> {
        let subscription = self.subscription.as_mut().ok_or(BoardError::NotSubscribed)?;
        let error = match subscription.next().await {
            Some(Ok(snapshot)) => {
                self.state.apply_snapshot(snapshot);
                return Ok(());
            }
            Some(Err(e)) => e,
            None => StoreError::SubscriptionClosed,
        };
        tracing::error!(error = %error, "task subscription failed");
        self.release();
        Err(error.into())
    }

    /// Creates a task from the draft.
    ///
    /// A blank title sends nothing and returns `Ok(None)`. On success the
    /// draft is cleared; the new task shows up with the next snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Store`] if the store rejects the request; the
    /// draft is kept.
    pub async fn create_task(&mut self) -> Result<Option<TaskId>, BoardError> {
        if self.state.draft.is_blank() {
            tracing::debug!("ignoring create with blank title");
            return Ok(None);
        }
        let color = self.pick_color();
        let Some(new_task) = self.state.draft.to_new_task(now_ms(), color) else {
            return Ok(None);
        };

        match self.store.create(&self.collection, new_task).await {
            Ok(id) => {
                tracing::info!(task_id = %id, %color, "task created");
                self.state.draft.clear();
                Ok(Some(id))
            }
            Err(e) => {
                tracing::error!(error = %e, "error adding task");
                Err(e.into())
            }
        }
    }

    /// Replaces a task's description.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Store`] if the update fails.
    pub async fn update_description(
        &self,
        id: &TaskId,
        description: &str,
    ) -> Result<(), BoardError> {
        self.patch(id, TaskPatch::description(description), "error updating description")
            .await
    }

    /// Flips a task's completion flag from `completed`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Store`] if the update fails.
    pub async fn toggle_completed(&self, id: &TaskId, completed: bool) -> Result<(), BoardError> {
        self.patch(id, TaskPatch::completed(!completed), "error toggling task")
            .await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Store`] if the delete fails, including when no
    /// task has this id.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), BoardError> {
        match self.store.delete(&self.collection, id).await {
            Ok(()) => {
                tracing::info!(task_id = %id, "task deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "error deleting task");
                Err(e.into())
            }
        }
    }

    async fn patch(
        &self,
        id: &TaskId,
        patch: TaskPatch,
        failure: &'static str,
    ) -> Result<(), BoardError> {
        match self.store.update(&self.collection, id, patch).await {
            Ok(()) => {
                tracing::debug!(task_id = %id, "task updated");
                Ok(())
            }
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "{failure}");
                Err(e.into())
            }
        }
    }

    fn pick_color(&mut self) -> TaskColor {
        PALETTE[self.rng.random_range(0..PALETTE.len())]
    }
}

/// Returns the current timestamp in milliseconds since epoch.
fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}
