//! Task document model.
//!
//! A [`Task`] is one document in the `tasks` collection. The store assigns
//! its [`TaskId`] on creation; everything else is supplied by the client in
//! a [`NewTask`]. After creation only `description` and `completed` change,
//! through a [`TaskPatch`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the collection every board reads and writes.
pub const TASKS_COLLECTION: &str = "tasks";

/// Opaque document identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an identifier handed out by a store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh time-ordered identifier (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the string form of this identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Background color of a sticky note. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskColor {
    /// Pastel yellow.
    Yellow,
    /// Pastel blue.
    Blue,
    /// Pastel pink.
    Pink,
    /// Pastel orange.
    Orange,
}

/// The fixed palette a new note's color is drawn from.
pub const PALETTE: [TaskColor; 4] = [
    TaskColor::Yellow,
    TaskColor::Blue,
    TaskColor::Pink,
    TaskColor::Orange,
];

impl TaskColor {
    /// Picks the palette entry at `index`, wrapping around.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        PALETTE[index % PALETTE.len()]
    }
}

impl std::fmt::Display for TaskColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yellow => write!(f, "yellow"),
            Self::Blue => write!(f, "blue"),
            Self::Pink => write!(f, "pink"),
            Self::Orange => write!(f, "orange"),
        }
    }
}

/// Fields sent with a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Note title. Never blank once persisted.
    pub title: String,
    /// Free-form description, possibly empty.
    pub description: String,
    /// Due date as typed (`YYYY-MM-DD`), empty when unset.
    pub due_date: String,
    /// Completion flag, `false` for every new note.
    pub completed: bool,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Note color.
    pub color: TaskColor,
}

/// A persisted task document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Note title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Due date as stored, empty when unset.
    pub due_date: String,
    /// Whether the note has been ticked off.
    pub completed: bool,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Note color.
    pub color: TaskColor,
}

impl Task {
    /// Builds the stored document from a create request and its new id.
    #[must_use]
    pub fn from_new(id: TaskId, new: NewTask) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            due_date: new.due_date,
            completed: new.completed,
            created_at: new.created_at,
            color: new.color,
        }
    }

    /// Whether a due date was recorded.
    #[must_use]
    pub fn has_due_date(&self) -> bool {
        !self.due_date.trim().is_empty()
    }
}

/// Partial update of the mutable task fields.
///
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement completion flag.
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// A patch that only replaces the description.
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            completed: None,
        }
    }

    /// A patch that only sets the completion flag.
    #[must_use]
    pub const fn completed(completed: bool) -> Self {
        Self {
            description: None,
            completed: Some(completed),
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }

    /// Applies the patch in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// Complete contents of a collection at one point in time.
///
/// Document order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every document in the collection.
    pub tasks: Vec<Task>,
}

impl Snapshot {
    /// Wraps a document list.
    #[must_use]
    pub const fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Looks up a document by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }
}
