use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::api::MovieDetail;
use crate::app::{App, DetailFocus, InputMode};
use crate::router::Route;
use crate::ui::colors::{
    ACCENT, ACCENT_SOFT, BORDER, CYAN, ERROR, GOLD, HIGHLIGHT_BG, TEXT_DIM, TEXT_PRIMARY,
    TEXT_SECONDARY,
};
use crate::ui::utils::{format_time, strip_tags};

pub fn render_details(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(detail) = app.details.detail.clone() else {
        let text = app
            .details
            .error
            .clone()
            .unwrap_or_else(|| "Đang tải thông tin phim...".to_string());
        let color = if app.details.error.is_some() { ERROR } else { TEXT_DIM };
        f.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(color))
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(BORDER))),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Meta
            Constraint::Length(6), // Synopsis
            Constraint::Min(5),    // Episodes | comments
        ])
        .split(area);

    render_meta(f, app, &detail, chunks[0]);

    let synopsis = Paragraph::new(strip_tags(&detail.content))
        .style(Style::default().fg(TEXT_SECONDARY))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER))
                .title(" Nội dung "),
        );
    f.render_widget(synopsis, chunks[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_episodes(f, app, &detail, bottom[0]);
    render_comments(f, app, &detail.movie.slug, bottom[1]);
}

fn render_meta(f: &mut Frame, app: &App, detail: &MovieDetail, area: Rect) {
    let movie = &detail.movie;
    let favorite = app.library.favorites.contains(&movie.slug);

    let mut title = vec![Span::styled(
        movie.name.clone(),
        Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
    )];
    if favorite {
        title.push(Span::styled("  ♥", Style::default().fg(ACCENT)));
    }

    let mut badges = vec![detail.kind.display_name().to_string()];
    for extra in [&movie.quality, &movie.lang, &movie.time, &movie.episode_current] {
        if let Some(v) = extra.as_ref().filter(|v| !v.is_empty()) {
            badges.push(v.clone());
        }
    }
    if !detail.status.is_empty() {
        badges.push(detail.status.clone());
    }

    let join = |items: Vec<&str>| if items.is_empty() { "-".to_string() } else { items.join(", ") };
    let categories = join(detail.category.iter().map(|c| c.name.as_str()).collect());
    let countries = join(detail.country.iter().map(|c| c.name.as_str()).collect());
    let directors = join(
        detail
            .director
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect(),
    );
    let cast = join(detail.cast().into_iter().take(6).collect());

    let label = Style::default().fg(TEXT_DIM);
    let value = Style::default().fg(TEXT_SECONDARY);
    let mut lines = vec![
        Line::from(title),
        Line::from(Span::styled(movie.subtitle(), Style::default().fg(ACCENT_SOFT))),
        Line::from(Span::styled(badges.join(" · "), Style::default().fg(GOLD))),
        Line::from(vec![Span::styled("Thể loại: ", label), Span::styled(categories, value)]),
        Line::from(vec![Span::styled("Quốc gia: ", label), Span::styled(countries, value)]),
        Line::from(vec![Span::styled("Đạo diễn: ", label), Span::styled(directors, value)]),
        Line::from(vec![Span::styled("Diễn viên: ", label), Span::styled(cast, value)]),
    ];
    if let Some(h) = app.library.history.get(&movie.slug) {
        lines.push(Line::from(Span::styled(
            format!("Đang xem {} · {} (c để xem tiếp)", h.episode_name, format_time(h.progress)),
            Style::default().fg(CYAN),
        )));
    }

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT)),
        ),
        area,
    );
}

/// Server tabs in the title, episodes of the selected server below
pub fn render_episodes(f: &mut Frame, app: &mut App, detail: &MovieDetail, area: Rect) {
    let focused = app.details.focus == DetailFocus::Episodes || !matches!(app.route(), Route::Details { .. });
    let border = if focused { ACCENT } else { BORDER };

    let mut tabs = vec![Span::raw(" ")];
    for (i, server) in detail.episodes.iter().enumerate() {
        let style = if i == app.details.server {
            Style::default().fg(TEXT_PRIMARY).bg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_DIM)
        };
        tabs.push(Span::styled(format!(" {} ", server.server_name), style));
        tabs.push(Span::raw(" "));
    }
    if detail.episodes.is_empty() {
        tabs.push(Span::styled("Tập phim ", Style::default().fg(border)));
    }

    let current = app.watch.episode_slug.clone();
    let watching = matches!(app.route(), Route::Watch { .. });
    let items: Vec<ListItem> = app
        .details
        .episodes()
        .iter()
        .map(|ep| {
            let marker = if watching && ep.slug == current { "● " } else { "  " };
            let source = if ep.link_m3u8.is_empty() { " (web)" } else { "" };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(ACCENT)),
                Span::styled(ep.name.clone(), Style::default().fg(TEXT_PRIMARY)),
                Span::styled(source, Style::default().fg(TEXT_DIM)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .title(Line::from(tabs));
    if items.is_empty() {
        f.render_widget(
            Paragraph::new("Chưa có tập phim.").style(Style::default().fg(TEXT_DIM)).block(block),
            area,
        );
        return;
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, area, &mut app.details.episode_state);
}

fn render_comments(f: &mut Frame, app: &mut App, slug: &str, area: Rect) {
    let focused = app.details.focus == DetailFocus::Comments;
    let editing = app.input_mode == InputMode::Comment;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if editing {
            [Constraint::Min(3), Constraint::Length(3)]
        } else {
            [Constraint::Min(3), Constraint::Length(0)]
        })
        .split(area);

    let comments = app.comments.for_movie(slug);
    let title = format!(" Bình luận ({}) ", comments.len());
    let items: Vec<ListItem> = comments
        .iter()
        .map(|c| {
            let when = chrono::DateTime::from_timestamp_millis(c.timestamp)
                .map(|d| d.with_timezone(&chrono::Local).format("%d/%m %H:%M").to_string())
                .unwrap_or_default();
            let heart = if c.is_liked { "♥" } else { "♡" };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!("[{}] ", c.user_avatar), Style::default().fg(CYAN)),
                    Span::styled(c.user_name.clone(), Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}  {} {}", when, heart, c.likes), Style::default().fg(TEXT_DIM)),
                ]),
                Line::from(Span::styled(format!("  {}", c.content), Style::default().fg(TEXT_SECONDARY))),
            ])
        })
        .collect();
    let empty = items.is_empty();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { ACCENT } else { BORDER }))
        .title(title);
    if empty {
        f.render_widget(
            Paragraph::new("Chưa có bình luận. Nhấn i để viết.")
                .style(Style::default().fg(TEXT_DIM))
                .block(block),
            chunks[0],
        );
    } else {
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(HIGHLIGHT_BG));
        f.render_stateful_widget(list, chunks[0], &mut app.details.comment_state);
    }

    if editing {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .title(" Viết bình luận ");
        let inner = block.inner(chunks[1]);
        let width = inner.width.max(1) as usize;
        let scroll = app.comment_input.visual_scroll(width);
        f.render_widget(
            Paragraph::new(app.comment_input.value())
                .scroll((0, scroll as u16))
                .block(block),
            chunks[1],
        );
        let x = inner.x + (app.comment_input.visual_cursor().max(scroll) - scroll) as u16;
        f.set_cursor_position(Position::new(x.min(inner.x + inner.width), inner.y));
    }
}
