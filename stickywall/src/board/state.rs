//! Local board state and its transitions.
//!
//! Nothing here touches the store: [`BoardState`] is rebuilt from snapshots
//! and edited by the input layer, so every rule about ordering, filtering
//! and drafts can be exercised without a backend.

use std::cmp::Ordering;

use chrono::NaiveDate;
use stickywall_proto::task::{NewTask, Snapshot, Task, TaskColor, TaskId};

/// Date format of the due-date field.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Title ordering of the rendered list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// A to Z.
    #[default]
    Ascending,
    /// Z to A.
    Descending,
}

impl SortOrder {
    /// The other order.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Selector label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ascending => "A to Z",
            Self::Descending => "Z to A",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Which slice of the board is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveView {
    /// Every task.
    #[default]
    All,
    /// Tasks due on the current local date.
    DueToday,
    /// Tasks due after the current local date.
    Upcoming,
}

impl ActiveView {
    /// All views in sidebar order.
    pub const ALL: [Self; 3] = [Self::All, Self::DueToday, Self::Upcoming];

    /// Sidebar label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::DueToday => "Due Today",
            Self::Upcoming => "Upcoming",
        }
    }

    /// Position in [`ActiveView::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::All => 0,
            Self::DueToday => 1,
            Self::Upcoming => 2,
        }
    }

    /// Next view down the sidebar, stopping at the last.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::All => Self::DueToday,
            Self::DueToday | Self::Upcoming => Self::Upcoming,
        }
    }

    /// Previous view up the sidebar, stopping at the first.
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::All | Self::DueToday => Self::All,
            Self::Upcoming => Self::DueToday,
        }
    }

    /// Whether `task` belongs in this view on the day `today`.
    ///
    /// Tasks without a readable due date only appear under [`ActiveView::All`].
    #[must_use]
    pub fn includes(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::DueToday => due_on(task) == Some(today),
            Self::Upcoming => due_on(task).is_some_and(|due| due > today),
        }
    }
}

/// Parses a task's due date, if it has a readable one.
#[must_use]
pub fn due_on(task: &Task) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(task.due_date.trim(), DUE_DATE_FORMAT).ok()
}

/// Compares two titles the way a person reads them: letters first without
/// regard to case, then lowercase before uppercase.
#[must_use]
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}

/// Sorts tasks by title in `order`.
///
/// Equal titles fall back to id order, so the result depends only on the
/// set of tasks, never on the order they arrived in.
pub fn sort_tasks(tasks: &mut [Task], order: SortOrder) {
    tasks.sort_by(|a, b| {
        let by_title = match order {
            SortOrder::Ascending => compare_titles(&a.title, &b.title),
            SortOrder::Descending => compare_titles(&b.title, &a.title),
        };
        by_title.then_with(|| a.id.cmp(&b.id))
    });
}

/// Input fields for a task that has not been created yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Title as typed.
    pub title: String,
    /// Description as typed.
    pub description: String,
    /// Due date as typed.
    pub due_date: String,
}

impl Draft {
    /// Whether the title is empty or only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }

    /// Empties all three fields.
    pub fn clear(&mut self) {
        self.title.clear();
        self.description.clear();
        self.due_date.clear();
    }

    /// Builds the create request, or `None` for a blank title.
    #[must_use]
    pub fn to_new_task(&self, created_at: u64, color: TaskColor) -> Option<NewTask> {
        if self.is_blank() {
            return None;
        }
        Some(NewTask {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date.trim().to_string(),
            completed: false,
            created_at,
            color,
        })
    }
}

/// The board's local view of the task collection.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    tasks: Vec<Task>,
    sort_order: SortOrder,
    active_view: ActiveView,
    /// Fields of the task being composed.
    pub draft: Draft,
}

impl BoardState {
    /// Creates an empty state with the given ordering.
    #[must_use]
    pub fn new(sort_order: SortOrder) -> Self {
        Self {
            sort_order,
            ..Self::default()
        }
    }

    /// All tasks from the latest snapshot, sorted.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Current title ordering.
    #[must_use]
    pub const fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Current view filter.
    #[must_use]
    pub const fn active_view(&self) -> ActiveView {
        self.active_view
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Replaces the task list with the contents of `snapshot`.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let mut tasks = snapshot.tasks;
        sort_tasks(&mut tasks, self.sort_order);
        self.tasks = tasks;
    }

    /// Changes the ordering. Returns whether anything changed.
    pub fn set_sort_order(&mut self, order: SortOrder) -> bool {
        if self.sort_order == order {
            return false;
        }
        self.sort_order = order;
        sort_tasks(&mut self.tasks, order);
        true
    }

    /// Changes the view filter.
    pub const fn set_active_view(&mut self, view: ActiveView) {
        self.active_view = view;
    }

    /// The sorted tasks that belong in the active view on `today`.
    #[must_use]
    pub fn visible_tasks(&self, today: NaiveDate) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| self.active_view.includes(t, today))
            .collect()
    }
}
