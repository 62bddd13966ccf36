//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};
use stickywall_proto::task::TaskColor;

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning color for status notices.
pub const WARNING: Color = Color::Yellow;

/// Error color for form messages.
pub const ERROR: Color = Color::Red;

/// Text color on sticky notes.
pub const NOTE_TEXT: Color = Color::Rgb(31, 41, 55);

/// Muted text color on sticky notes.
pub const NOTE_MUTED: Color = Color::Rgb(75, 85, 99);

/// Panel title color for the views sidebar.
pub const VIEWS_TITLE: Color = Color::Blue;

/// Panel title color for the board.
pub const BOARD_TITLE: Color = Color::Green;

/// Background of a note with the given palette color.
#[must_use]
pub const fn note_background(color: TaskColor) -> Color {
    match color {
        TaskColor::Yellow => Color::Rgb(254, 249, 195),
        TaskColor::Blue => Color::Rgb(219, 234, 254),
        TaskColor::Pink => Color::Rgb(252, 231, 243),
        TaskColor::Orange => Color::Rgb(255, 237, 213),
    }
}

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (placeholders, hints).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (focused panel borders).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Selected item style (in lists).
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Style for the status bar background.
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Style for panel titles with a given color (bold).
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Base style of a note card.
#[must_use]
pub fn note(color: TaskColor) -> Style {
    Style::default().fg(NOTE_TEXT).bg(note_background(color))
}

/// Title style of a completed note.
#[must_use]
pub fn note_done() -> Style {
    Style::default()
        .fg(NOTE_MUTED)
        .add_modifier(Modifier::CROSSED_OUT)
}

/// Style for form and status errors.
#[must_use]
pub fn error() -> Style {
    Style::default().fg(ERROR)
}

/// Border style for a panel or field, depending on focus.
#[must_use]
pub fn border(focused: bool) -> Style {
    if focused { highlighted() } else { normal() }
}
