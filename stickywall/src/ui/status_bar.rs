//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, PanelFocus, Screen};
use crate::auth::IdentityService;
use crate::store::DocumentStore;

/// Render the status bar at the bottom of the screen.
pub fn render<S: DocumentStore, I: IdentityService>(frame: &mut Frame, area: Rect, app: &App<S, I>) {
    let help_text = match (app.screen, app.focus) {
        (Screen::Login, _) => "Enter: submit | Tab: switch field | Ctrl+T: login/register | Esc: quit",
        (Screen::Board, _) if app.editing.is_some() => "Type to edit description | Enter/Esc: done",
        (Screen::Board, PanelFocus::Views) => {
            "Tab: switch panel | ↑↓/jk: view | s: sort | Esc: quit"
        }
        (Screen::Board, PanelFocus::Draft) => {
            "Tab: switch panel | ↑↓: field | Enter: add note | Ctrl+S: sort | Esc: quit"
        }
        (Screen::Board, PanelFocus::Notes) => {
            "Tab: switch panel | arrows: select | Space: done | e: edit | d: delete | s: sort"
        }
    };

    let (dot_color, who) = match app.gate.session() {
        Some(session) => (theme::SUCCESS, session.email.clone()),
        None => (theme::FG_SECONDARY, "Signed out".to_string()),
    };

    let tail = match &app.notice {
        Some(notice) => Span::styled(notice.as_str(), theme::normal().fg(theme::WARNING)),
        None => Span::styled(help_text, theme::dimmed()),
    };

    let status_line = Line::from(vec![
        Span::styled(concat!("Sticky Wall v", env!("CARGO_PKG_VERSION")), theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {who}")),
        Span::raw(" | "),
        tail,
    ]);

    let paragraph = Paragraph::new(status_line).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
