//! Login / registration screen.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::theme;
use crate::app::{App, LoginField};
use crate::auth::IdentityService;
use crate::store::DocumentStore;

/// Render the auth form centered in `area`.
pub fn render<S: DocumentStore, I: IdentityService>(frame: &mut Frame, area: Rect, app: &App<S, I>) {
    let form = app.gate.form();
    let card = super::centered(area, 48, 15);

    let block = Block::default()
        .title(Span::styled(
            format!(" {} to Sticky Wall ", form.mode.label()),
            theme::panel_title(theme::BOARD_TITLE),
        ))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(theme::normal());
    let inner = block.inner(card);
    frame.render_widget(Clear, card);
    frame.render_widget(block, card);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Error
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(1), // Submit
            Constraint::Length(1),
            Constraint::Length(1), // Mode switch
            Constraint::Min(0),
        ])
        .split(inner);

    if let Some(error) = &form.error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.as_str(), theme::error())),
            rows[0],
        );
    }

    let masked = "\u{2022}".repeat(form.password.chars().count());
    render_field(
        frame,
        rows[1],
        "Email",
        &form.email,
        app.login_field == LoginField::Email,
    );
    render_field(
        frame,
        rows[2],
        "Password",
        &masked,
        app.login_field == LoginField::Password,
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("[ {} ]  (Enter)", form.mode.label()),
            theme::bold(),
        ))
        .alignment(Alignment::Center),
        rows[3],
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(form.mode.switch_hint(), theme::dimmed()),
            Span::styled("  (Ctrl+T)", theme::dimmed()),
        ]))
        .alignment(Alignment::Center),
        rows[5],
    );
}

/// A bordered single-line input with a placeholder when empty.
fn render_field(frame: &mut Frame, area: Rect, placeholder: &str, value: &str, focused: bool) {
    let content = if value.is_empty() && !focused {
        Span::styled(placeholder.to_string(), theme::dimmed())
    } else if focused {
        Span::styled(format!("{value}\u{258f}"), theme::normal())
    } else {
        Span::styled(value.to_string(), theme::normal())
    };
    let block = Block::default()
        .title(placeholder)
        .borders(Borders::ALL)
        .border_style(theme::border(focused));
    frame.render_widget(Paragraph::new(content).block(block), area);
}
