use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::colors::{ACCENT, BORDER, ERROR, HIGHLIGHT_BG, TEXT_DIM, TEXT_SECONDARY};
use crate::ui::utils::movie_line;

pub fn render_browse(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let title = app
        .browse
        .query
        .as_ref()
        .map(|q| q.listing().title())
        .unwrap_or_default();
    let total = app.browse.pagination.total_items.get();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(" {} ", title))
        .title_bottom(if total > 0 {
            format!(" {} phim ", total)
        } else {
            String::new()
        });

    if let Some(err) = &app.browse.error {
        let p = Paragraph::new(err.as_str())
            .style(Style::default().fg(ERROR))
            .block(block);
        f.render_widget(p, chunks[0]);
    } else if app.browse.items.is_empty() && app.loading.is_none() {
        let p = Paragraph::new("Không tìm thấy phim nào.")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(p, chunks[0]);
    } else {
        let items: Vec<ListItem> = app
            .browse
            .items
            .iter()
            .map(|m| ListItem::new(movie_line(m)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");
        f.render_stateful_widget(list, chunks[0], &mut app.browse.list_state);
    }

    let p = &app.browse.pagination;
    let nav = format!(
        "{}Trang {}/{}{}",
        if p.has_previous() { "◀ " } else { "  " },
        p.current(),
        p.total_pages().max(1),
        if p.has_next() { " ▶" } else { "  " },
    );
    f.render_widget(
        Paragraph::new(nav)
            .style(Style::default().fg(TEXT_SECONDARY))
            .alignment(Alignment::Center),
        chunks[1],
    );
}
