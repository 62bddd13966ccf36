//! Sidebar rendering for the view list.

use ratatui::{
    Frame,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, List, ListItem},
};

use super::theme;
use crate::app::{App, PanelFocus};
use crate::auth::IdentityService;
use crate::board::ActiveView;
use crate::store::DocumentStore;

/// Render the sidebar with the three views.
pub fn render<S: DocumentStore, I: IdentityService>(frame: &mut Frame, area: Rect, app: &App<S, I>) {
    let is_focused = app.focus == PanelFocus::Views;
    let active = app.board.state().active_view();

    let items: Vec<ListItem> = ActiveView::ALL
        .iter()
        .map(|view| {
            let is_selected = *view == active;
            let style = if is_selected && is_focused {
                theme::selected()
            } else if is_selected {
                theme::highlighted()
            } else {
                theme::normal()
            };
            ListItem::new(format!(" {}", view.label())).style(style)
        })
        .collect();

    let block = Block::default()
        .title(Span::styled("Views", theme::panel_title(theme::VIEWS_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused));

    frame.render_widget(List::new(items).block(block), area);
}
