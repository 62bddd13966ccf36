//! Terminal UI rendering.

pub mod board_panel;
pub mod login;
pub mod sidebar;
pub mod status_bar;
pub mod theme;

use std::fmt::Write as _;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};
use stickywall_proto::task::Task;

use crate::app::{App, Screen};
use crate::auth::IdentityService;
use crate::board::due_on;
use crate::store::DocumentStore;

/// Main draw function for the entire UI.
pub fn draw<S: DocumentStore, I: IdentityService>(frame: &mut Frame, app: &App<S, I>) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let content_area = main_chunks[0];
    let status_area = main_chunks[1];

    match app.screen {
        Screen::Login => login::render(frame, content_area, app),
        Screen::Board => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(25), // Views
                    Constraint::Percentage(75), // Board
                ])
                .split(content_area);

            sidebar::render(frame, content_chunks[0], app);
            board_panel::render(frame, content_chunks[1], app);
        }
    }

    status_bar::render(frame, status_area, app);
}

/// A `width` x `height` rectangle centered in `area`, clipped to it.
#[must_use]
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Due date as shown on a note.
///
/// Parseable dates use `format`; anything else is shown as stored.
#[must_use]
pub fn format_due_date(task: &Task, format: &str) -> String {
    let Some(date) = due_on(task) else {
        return task.due_date.trim().to_string();
    };
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        return task.due_date.trim().to_string();
    }
    out
}
