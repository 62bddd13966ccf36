//! Board rendering: header, new-note form and the note grid.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use stickywall_proto::task::Task;

use super::theme;
use crate::app::{App, DraftField, GRID_COLUMNS, PanelFocus};
use crate::auth::IdentityService;
use crate::store::DocumentStore;

/// Height of one note card, borders included.
const CARD_HEIGHT: u16 = 8;

/// Render the main board area.
pub fn render<S: DocumentStore, I: IdentityService>(frame: &mut Frame, area: Rect, app: &App<S, I>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(5), // Draft form
            Constraint::Min(CARD_HEIGHT),
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_draft(frame, chunks[1], app);
    render_grid(frame, chunks[2], app);
}

fn render_header<S: DocumentStore, I: IdentityService>(
    frame: &mut Frame,
    area: Rect,
    app: &App<S, I>,
) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(12), Constraint::Length(20)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Span::styled(
            " Sticky Wall",
            theme::panel_title(theme::BOARD_TITLE),
        )),
        halves[0],
    );
    let sort = app.board.state().sort_order();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Sort: ", theme::dimmed()),
            Span::styled(sort.label(), theme::bold()),
            Span::raw(" "),
        ]))
        .alignment(Alignment::Right),
        halves[1],
    );
}

fn render_draft<S: DocumentStore, I: IdentityService>(
    frame: &mut Frame,
    area: Rect,
    app: &App<S, I>,
) {
    let focused = app.focus == PanelFocus::Draft;
    let draft = &app.board.state().draft;

    let field = |label: &'static str, value: &str, which: DraftField| {
        let active = focused && app.draft_field == which;
        let marker = if active { "> " } else { "  " };
        let value = if value.is_empty() && !active {
            Span::styled(label, theme::dimmed())
        } else if active {
            Span::styled(format!("{value}\u{258f}"), theme::normal())
        } else {
            Span::styled(value.to_string(), theme::normal())
        };
        Line::from(vec![Span::styled(marker, theme::highlighted()), value])
    };

    let mut due = field("Due date (YYYY-MM-DD)", &draft.due_date, DraftField::DueDate);
    due.spans
        .push(Span::styled("   [ Add Note ]", theme::bold()));
    let lines = vec![
        field("Task title", &draft.title, DraftField::Title),
        field("Task description", &draft.description, DraftField::Description),
        due,
    ];

    let block = Block::default()
        .title("New note")
        .borders(Borders::ALL)
        .border_style(theme::border(focused));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_grid<S: DocumentStore, I: IdentityService>(
    frame: &mut Frame,
    area: Rect,
    app: &App<S, I>,
) {
    let focused = app.focus == PanelFocus::Notes;
    let tasks = app.visible_tasks();

    if tasks.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No notes here yet.", theme::dimmed()))
                .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let rows_fit = usize::from((area.height / CARD_HEIGHT).max(1));
    let selected_row = app.selected_note / GRID_COLUMNS;
    let first_row = selected_row.saturating_sub(rows_fit - 1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); rows_fit])
        .split(area);

    for (slot, row) in tasks
        .chunks(GRID_COLUMNS)
        .skip(first_row)
        .take(rows_fit)
        .enumerate()
    {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Fill(1); GRID_COLUMNS])
            .split(row_areas[slot]);

        for (col, task) in row.iter().enumerate() {
            let index = (first_row + slot) * GRID_COLUMNS + col;
            let selected = focused && index == app.selected_note;
            render_note(frame, cells[col], app, task, selected);
        }
    }
}

fn render_note<S: DocumentStore, I: IdentityService>(
    frame: &mut Frame,
    area: Rect,
    app: &App<S, I>,
    task: &Task,
    selected: bool,
) {
    let base = theme::note(task.color);
    let title_style = if task.completed {
        base.patch(theme::note_done())
    } else {
        base.add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(task.title.as_str(), title_style),
        Span::styled("  \u{00d7}", base.fg(theme::NOTE_MUTED)),
    ])];

    let description = if app.editing.as_ref() == Some(&task.id) {
        Line::from(Span::styled(format!("{}\u{258f}", task.description), base))
    } else if task.description.is_empty() {
        Line::from(Span::styled("Add description...", base.fg(theme::NOTE_MUTED)))
    } else {
        Line::from(Span::styled(task.description.as_str(), base))
    };
    lines.push(description);

    if task.has_due_date() {
        lines.push(Line::from(Span::styled(
            format!("Due: {}", super::format_due_date(task, &app.date_format)),
            base.fg(theme::NOTE_MUTED),
        )));
    }

    let (checkbox, status) = if task.completed {
        ("[x]", "Completed")
    } else {
        ("[ ]", "In Progress")
    };
    lines.push(Line::from(vec![
        Span::styled(checkbox, base),
        Span::styled(format!(" {status}"), base.fg(theme::NOTE_MUTED)),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .style(base)
        .border_style(if selected {
            base.fg(theme::HIGHLIGHT).add_modifier(Modifier::BOLD)
        } else {
            base
        });

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}
