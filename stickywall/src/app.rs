//! Application state and event handling.
//!
//! [`App`] ties the auth gate and the board to the terminal. Key handling
//! is synchronous and only edits local state; anything that talks to a
//! collaborator comes back as an [`Action`] for [`App::perform`] to await.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use stickywall_proto::task::{Task, TaskId};

use crate::auth::{AuthGate, IdentityService};
use crate::board::{Board, BoardError, SortOrder};
use crate::store::DocumentStore;

/// Notes per row in the grid.
pub const GRID_COLUMNS: usize = 3;

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Sign-in / registration form.
    Login,
    /// The task board.
    Board,
}

/// Focused field of the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    /// Email input.
    Email,
    /// Password input.
    Password,
}

/// Which board panel is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Views sidebar.
    Views,
    /// New-task form.
    Draft,
    /// Note grid.
    Notes,
}

/// Focused field of the new-task form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    /// Title input.
    Title,
    /// Description input.
    Description,
    /// Due date input.
    DueDate,
}

impl DraftField {
    const fn next(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::DueDate,
            Self::DueDate => Self::Title,
        }
    }

    const fn prev(self) -> Self {
        match self {
            Self::Title => Self::DueDate,
            Self::Description => Self::Title,
            Self::DueDate => Self::Description,
        }
    }
}

/// A user intent that needs a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Submit the login form.
    SubmitAuth,
    /// Create a task from the draft.
    CreateTask,
    /// Save an edited description.
    UpdateDescription {
        /// Target note.
        id: TaskId,
        /// New description.
        description: String,
    },
    /// Flip a note's completion flag.
    ToggleCompleted {
        /// Target note.
        id: TaskId,
        /// Flag as currently rendered.
        completed: bool,
    },
    /// Delete a note.
    DeleteTask {
        /// Target note.
        id: TaskId,
    },
    /// Switch the title ordering.
    SetSortOrder(SortOrder),
}

/// Main application state.
pub struct App<S, I> {
    /// Login gate.
    pub gate: AuthGate<I>,
    /// Task board.
    pub board: Board<S>,
    /// Current screen.
    pub screen: Screen,
    /// Focused login field.
    pub login_field: LoginField,
    /// Focused board panel.
    pub focus: PanelFocus,
    /// Focused draft field.
    pub draft_field: DraftField,
    /// Index of the selected note among the visible ones.
    pub selected_note: usize,
    /// Note whose description is being edited inline.
    pub editing: Option<TaskId>,
    /// One-line message for the status bar.
    pub notice: Option<String>,
    /// Display format for due dates.
    pub date_format: String,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl<S: DocumentStore, I: IdentityService> App<S, I> {
    /// Creates the app on the login screen.
    #[must_use]
    pub fn new(gate: AuthGate<I>, board: Board<S>) -> Self {
        Self {
            gate,
            board,
            screen: Screen::Login,
            login_field: LoginField::Email,
            focus: PanelFocus::Draft,
            draft_field: DraftField::Title,
            selected_note: 0,
            editing: None,
            notice: None,
            date_format: crate::board::DUE_DATE_FORMAT.to_string(),
            should_quit: false,
        }
    }

    /// Sets the due date display format.
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Local calendar date used by the view filters.
    #[must_use]
    pub fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    /// Notes shown in the grid, in display order.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.board.state().visible_tasks(Self::today())
    }

    /// The selected note, if any.
    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected_note).copied()
    }

    /// Handle a key event.
    ///
    /// Returns an [`Action`] when the key asks for work the app cannot do
    /// synchronously.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if matches!(
            (key.code, key.modifiers),
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
        ) {
            self.should_quit = true;
            return None;
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Board => self.handle_board_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Option<Action> {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => self.should_quit = true,
            (KeyCode::Char('t'), KeyModifiers::CONTROL) => {
                let form = self.gate.form_mut();
                form.toggle_mode();
                form.error = None;
            }
            (KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down, _) => {
                self.login_field = match self.login_field {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            (KeyCode::Enter, _) => return Some(Action::SubmitAuth),
            (KeyCode::Char(c), _) => self.login_input().push(c),
            (KeyCode::Backspace, _) => {
                self.login_input().pop();
            }
            _ => {}
        }
        None
    }

    fn login_input(&mut self) -> &mut String {
        let form = self.gate.form_mut();
        match self.login_field {
            LoginField::Email => &mut form.email,
            LoginField::Password => &mut form.password,
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.editing.is_some() {
            return self.handle_editing_key(key);
        }

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => {
                self.should_quit = true;
                return None;
            }
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => return Some(self.sort_toggle()),
            (KeyCode::BackTab, _) => {
                self.cycle_focus_backward();
                return None;
            }
            (KeyCode::Tab, _) => {
                self.cycle_focus_forward();
                return None;
            }
            _ => {}
        }

        match self.focus {
            PanelFocus::Views => self.handle_views_key(key),
            PanelFocus::Draft => self.handle_draft_key(key),
            PanelFocus::Notes => self.handle_notes_key(key),
        }
    }

    fn handle_views_key(&mut self, key: KeyEvent) -> Option<Action> {
        let view = self.board.state().active_view();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.set_view(view.prev()),
            KeyCode::Down | KeyCode::Char('j') => self.set_view(view.next()),
            KeyCode::Char('s') => return Some(self.sort_toggle()),
            _ => {}
        }
        None
    }

    fn handle_draft_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Enter => return Some(Action::CreateTask),
            KeyCode::Up => self.draft_field = self.draft_field.prev(),
            KeyCode::Down => self.draft_field = self.draft_field.next(),
            KeyCode::Char(c) => self.draft_input().push(c),
            KeyCode::Backspace => {
                self.draft_input().pop();
            }
            _ => {}
        }
        None
    }

    fn draft_input(&mut self) -> &mut String {
        let draft = self.board.draft_mut();
        match self.draft_field {
            DraftField::Title => &mut draft.title,
            DraftField::Description => &mut draft.description,
            DraftField::DueDate => &mut draft.due_date,
        }
    }

    fn handle_notes_key(&mut self, key: KeyEvent) -> Option<Action> {
        let count = self.visible_tasks().len();
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_note = self.selected_note.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.selected_note + 1 < count {
                    self.selected_note += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_note = self.selected_note.saturating_sub(GRID_COLUMNS);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_note + GRID_COLUMNS < count {
                    self.selected_note += GRID_COLUMNS;
                }
            }
            KeyCode::Char('s') => return Some(self.sort_toggle()),
            KeyCode::Char(' ' | 'x') => {
                let task = self.selected_task()?;
                return Some(Action::ToggleCompleted {
                    id: task.id.clone(),
                    completed: task.completed,
                });
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let task = self.selected_task()?;
                return Some(Action::DeleteTask {
                    id: task.id.clone(),
                });
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                self.editing = Some(self.selected_task()?.id.clone());
            }
            _ => {}
        }
        None
    }

    /// Keys while a description is edited inline.
    ///
    /// Every change goes to the store at once, built from the stored text.
    /// Enter and Esc only leave edit mode.
    fn handle_editing_key(&mut self, key: KeyEvent) -> Option<Action> {
        let id = self.editing.clone()?;
        let Some(task) = self.board.state().task(&id) else {
            self.editing = None;
            return None;
        };
        let mut description = task.description.clone();
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.editing = None;
                return None;
            }
            KeyCode::Char(c) => description.push(c),
            KeyCode::Backspace => {
                description.pop()?;
            }
            _ => return None,
        }
        Some(Action::UpdateDescription { id, description })
    }

    fn sort_toggle(&self) -> Action {
        Action::SetSortOrder(self.board.state().sort_order().toggled())
    }

    fn set_view(&mut self, view: crate::board::ActiveView) {
        self.board.set_active_view(view);
        self.selected_note = 0;
    }

    /// Cycle focus forward: Views -> Draft -> Notes -> Views.
    const fn cycle_focus_forward(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Views => PanelFocus::Draft,
            PanelFocus::Draft => PanelFocus::Notes,
            PanelFocus::Notes => PanelFocus::Views,
        };
    }

    /// Cycle focus backward: Views -> Notes -> Draft -> Views.
    const fn cycle_focus_backward(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Views => PanelFocus::Notes,
            PanelFocus::Notes => PanelFocus::Draft,
            PanelFocus::Draft => PanelFocus::Views,
        };
    }

    /// Carries out an action against the collaborators.
    ///
    /// Failures never end the app; they leave a notice for the status bar.
    pub async fn perform(&mut self, action: Action) {
        match action {
            Action::SubmitAuth => {
                if self.gate.submit().await.is_some() {
                    self.screen = Screen::Board;
                    self.notice = None;
                    let result = self.board.activate().await;
                    self.report(result.map(|()| None), "Could not load tasks");
                }
            }
            Action::CreateTask => {
                let result = self.board.create_task().await;
                if matches!(result, Ok(Some(_))) {
                    self.draft_field = DraftField::Title;
                }
                self.report(result.map(|_| None), "Error adding task");
            }
            Action::UpdateDescription { id, description } => {
                let result = self.board.update_description(&id, &description).await;
                self.report(result.map(|()| None), "Error updating description");
            }
            Action::ToggleCompleted { id, completed } => {
                let result = self.board.toggle_completed(&id, completed).await;
                self.report(result.map(|()| None), "Error updating task");
            }
            Action::DeleteTask { id } => {
                let result = self.board.delete_task(&id).await;
                self.report(result.map(|()| None), "Error deleting task");
            }
            Action::SetSortOrder(order) => {
                let result = self.board.set_sort_order(order).await;
                self.report(
                    result.map(|()| Some(format!("Sorted {}", order.label()))),
                    "Could not reload tasks",
                );
            }
        }
    }

    fn report(&mut self, result: Result<Option<String>, BoardError>, context: &str) {
        match result {
            Ok(message) => self.notice = message,
            Err(e) => self.notice = Some(format!("{context}: {e}")),
        }
    }

    /// Applies pending snapshots and keeps the selection in range.
    pub fn poll(&mut self) {
        let was_active = self.board.is_active();
        self.board.poll_snapshots();
        if was_active && !self.board.is_active() {
            self.notice = Some("Live updates stopped".to_string());
        }

        let count = self.visible_tasks().len();
        if self.selected_note >= count {
            self.selected_note = count.saturating_sub(1);
        }
        if let Some(id) = &self.editing
            && self.board.state().task(id).is_none()
        {
            self.editing = None;
        }
    }

    /// Releases the live query before exit.
    pub fn shutdown(&mut self) {
        self.board.deactivate();
    }
}
