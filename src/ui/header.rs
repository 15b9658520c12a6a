use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, InputMode};
use crate::ui::colors::{ACCENT, BORDER, HIGHLIGHT_BG, TEXT_DIM, TEXT_PRIMARY, TEXT_SECONDARY};
use crate::ui::utils::movie_line;

pub fn render_header(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(16), // Brand
            Constraint::Min(20),    // Search box
            Constraint::Length(30), // Current path
        ])
        .split(area);

    let brand = Paragraph::new(Line::from(vec![
        Span::styled(" Binh", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled("VietSub", Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
    ]))
    .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(BORDER)))
    .alignment(Alignment::Left);
    f.render_widget(brand, chunks[0]);

    render_search_box(f, app, chunks[1]);

    let path = Paragraph::new(app.route().to_path())
        .style(Style::default().fg(TEXT_DIM))
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(BORDER)));
    f.render_widget(path, chunks[2]);
}

fn render_search_box(f: &mut Frame, app: &mut App, area: Rect) {
    app.area_search = area;
    let editing = app.input_mode == InputMode::Search;
    let border = if editing { ACCENT } else { BORDER };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .title(" Tìm kiếm (/) ");
    let inner = block.inner(area);

    let width = inner.width.max(1) as usize;
    let scroll = app.search_input.visual_scroll(width);
    let text = if app.search_input.value().is_empty() && !editing {
        Span::styled("Nhập tên phim...", Style::default().fg(TEXT_DIM))
    } else {
        Span::styled(app.search_input.value().to_string(), Style::default().fg(TEXT_PRIMARY))
    };
    let p = Paragraph::new(Line::from(text))
        .scroll((0, scroll as u16))
        .block(block);
    f.render_widget(p, area);

    if editing {
        let x = inner.x + (app.search_input.visual_cursor().max(scroll) - scroll) as u16;
        f.set_cursor_position(Position::new(x.min(inner.x + inner.width), inner.y));
    }
}

/// Instant results under the search box; recent queries while typing a short one
pub fn render_search_dropdown(f: &mut Frame, app: &mut App, screen: Rect) {
    let anchor = app.area_search;
    if !app.search.is_visible() {
        app.area_dropdown = Rect::default();
        if app.input_mode == InputMode::Search {
            render_recent_suggestions(f, app, anchor, screen);
        }
        return;
    }

    let rows = app.search.results.len() as u16;
    let top = anchor.y + anchor.height;
    let height = (rows + 2).min(screen.height.saturating_sub(top));
    if height < 3 {
        app.area_dropdown = Rect::default();
        return;
    }
    let area = Rect::new(anchor.x, top, anchor.width, height);
    app.area_dropdown = area;

    let items: Vec<ListItem> = app.search.results.iter().map(|m| ListItem::new(movie_line(m))).collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT))
                .title(format!(" Kết quả cho \"{}\" ", app.search.query())),
        )
        .highlight_style(Style::default().bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(app.search.selected);
    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_recent_suggestions(f: &mut Frame, app: &App, anchor: Rect, screen: Rect) {
    let suggestions = app.search.suggestions(app.search.query());
    if suggestions.is_empty() {
        return;
    }
    let top = anchor.y + anchor.height;
    let height = (suggestions.len() as u16 + 2).min(screen.height.saturating_sub(top));
    if height < 3 {
        return;
    }
    let area = Rect::new(anchor.x, top, anchor.width, height);
    let items: Vec<ListItem> = suggestions
        .into_iter()
        .map(|q| ListItem::new(Span::styled(q, Style::default().fg(TEXT_SECONDARY))))
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER))
            .title(" Tìm gần đây (Tab) "),
    );
    f.render_widget(Clear, area);
    f.render_widget(list, area);
}
