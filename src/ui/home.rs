use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::colors::{ACCENT, BORDER, ERROR, GOLD, HIGHLIGHT_BG, TEXT_DIM};
use crate::ui::utils::movie_line;

/// Home sections in a 2x2 grid
pub fn render_home(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let mut cells = Vec::new();
    for row in rows.iter() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*row);
        cells.extend(cols.iter().copied());
    }

    let focus = app.home.focus;
    for (i, (row, cell)) in app.home.rows.iter_mut().zip(cells).enumerate() {
        let focused = i == focus;
        let border = if focused { ACCENT } else { BORDER };
        let mut title = vec![Span::styled(
            format!(" {} ", row.section.title()),
            Style::default().fg(border).add_modifier(Modifier::BOLD),
        )];
        if focused {
            title.push(Span::styled("[a] xem tất cả ", Style::default().fg(GOLD)));
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(ratatui::text::Line::from(title));

        if let Some(err) = &row.error {
            let p = Paragraph::new(format!("Không tải được: {} (r để thử lại)", err))
                .style(Style::default().fg(ERROR))
                .wrap(ratatui::widgets::Wrap { trim: true })
                .block(block);
            f.render_widget(p, cell);
            continue;
        }
        if row.items.is_empty() {
            let p = Paragraph::new("Đang tải...")
                .style(Style::default().fg(TEXT_DIM))
                .block(block);
            f.render_widget(p, cell);
            continue;
        }

        let items: Vec<ListItem> = row.items.iter().map(|m| ListItem::new(movie_line(m))).collect();
        let mut list = List::new(items).block(block);
        if focused {
            list = list
                .highlight_style(Style::default().bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD))
                .highlight_symbol("▶ ");
        }
        f.render_stateful_widget(list, cell, &mut row.state);
    }
}
