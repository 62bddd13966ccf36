//! Task board view-model.
//!
//! [`BoardState`] is the local, sorted and filtered picture of the `tasks`
//! collection; [`Board`] keeps it fed from a live subscription and issues
//! the create / update / toggle / delete requests. The task list is only
//! ever replaced by an incoming snapshot, never edited in place.

pub mod state;
pub mod view_model;

pub use state::{
    ActiveView, BoardState, DUE_DATE_FORMAT, Draft, SortOrder, compare_titles, due_on, sort_tasks,
};
pub use view_model::Board;

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during board operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    /// The document store refused or failed the request.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The board has no live subscription.
    #[error("board is not subscribed to the task collection")]
    NotSubscribed,
}
