use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, LibraryTab};
use crate::ui::colors::{ACCENT, BORDER, CYAN, HIGHLIGHT_BG, SUCCESS, TEXT_DIM, TEXT_PRIMARY};
use crate::ui::utils::{format_time, movie_line, progress_bar};

pub fn render_library(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(area);

    let selected = match app.library_view.tab {
        LibraryTab::History => 0,
        LibraryTab::Favorites => 1,
    };
    let tabs = Tabs::new(vec![
        format!("Lịch sử ({})", app.library.history.items.len()),
        format!("Yêu thích ({})", app.library.favorites.items.len()),
    ])
    .select(selected)
    .style(Style::default().fg(TEXT_DIM))
    .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    let (items, empty): (Vec<ListItem>, &str) = match app.library_view.tab {
        LibraryTab::History => (
            app.library
                .history
                .items
                .iter()
                .map(|h| {
                    let progress = if h.duration > 0.0 {
                        format!(
                            "{} {} / {}",
                            progress_bar(h.progress_ratio(), 12),
                            format_time(h.progress),
                            format_time(h.duration)
                        )
                    } else {
                        format_time(h.progress)
                    };
                    let done = if h.is_finished() { " ✓" } else { "" };
                    ListItem::new(vec![
                        Line::from(Span::styled(
                            h.name.clone(),
                            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
                        )),
                        Line::from(vec![
                            Span::styled(format!("  {} ", h.episode_name), Style::default().fg(CYAN)),
                            Span::styled(progress, Style::default().fg(TEXT_DIM)),
                            Span::styled(done, Style::default().fg(SUCCESS)),
                        ]),
                    ])
                })
                .collect(),
            "Chưa xem phim nào.",
        ),
        LibraryTab::Favorites => (
            app.library
                .favorites
                .items
                .iter()
                .map(|m| ListItem::new(movie_line(m)))
                .collect(),
            "Chưa có phim yêu thích. Nhấn f trên một phim để thêm.",
        ),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    if items.is_empty() {
        f.render_widget(
            Paragraph::new(empty).style(Style::default().fg(TEXT_DIM)).block(block),
            chunks[1],
        );
        return;
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(HIGHLIGHT_BG))
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, chunks[1], &mut app.library_view.list_state);
}
