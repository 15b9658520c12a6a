use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, PlaybackStatus};
use crate::ui::colors::{
    ACCENT, BORDER, CYAN, ERROR, GOLD, SUCCESS, TEXT_DIM, TEXT_PRIMARY, TEXT_SECONDARY,
};
use crate::ui::details::render_episodes;
use crate::ui::utils::{format_time, progress_bar};

pub fn render_watch(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_now_playing(f, app, chunks[0]);

    match app.details.detail.clone() {
        Some(detail) if detail.movie.slug == app.watch.slug => {
            render_episodes(f, app, &detail, chunks[1]);
        }
        _ => {
            f.render_widget(
                Paragraph::new("Đang tải danh sách tập...")
                    .style(Style::default().fg(TEXT_DIM))
                    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(BORDER))),
                chunks[1],
            );
        }
    }
}

fn status_line(status: &PlaybackStatus, player: &str) -> Line<'static> {
    let (text, color) = match status {
        PlaybackStatus::Idle => ("Chưa phát".to_string(), TEXT_DIM),
        PlaybackStatus::Starting => (format!("Đang mở {}...", player), GOLD),
        PlaybackStatus::Playing => (format!("Đang phát trong {}", player), SUCCESS),
        PlaybackStatus::InBrowser => ("Đang phát trong trình duyệt".to_string(), CYAN),
        PlaybackStatus::Ended => ("Đã dừng".to_string(), TEXT_SECONDARY),
        PlaybackStatus::Failed(e) => (format!("Lỗi: {}", e), ERROR),
    };
    Line::from(Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)))
}

fn render_now_playing(f: &mut Frame, app: &App, area: Rect) {
    let detail = app
        .details
        .detail
        .as_ref()
        .filter(|d| d.movie.slug == app.watch.slug);
    let title = detail
        .map(|d| d.movie.name.clone())
        .unwrap_or_else(|| app.watch.slug.clone());
    let episode = detail
        .and_then(|d| d.find_episode(&app.watch.episode_slug))
        .map(|(_, ep)| ep.name.clone())
        .unwrap_or_else(|| app.watch.episode_slug.clone());

    let mut lines = vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(episode, Style::default().fg(ACCENT))),
        Line::from(""),
        status_line(&app.watch.status, &app.config.player_command),
    ];

    if let Some(pos) = app.watch.position {
        let width = area.width.saturating_sub(20).max(10) as usize;
        let ratio = if pos.duration > 0.0 { pos.position / pos.duration } else { 0.0 };
        let total = if pos.duration > 0.0 { format_time(pos.duration) } else { "--:--".to_string() };
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(progress_bar(ratio, width), Style::default().fg(ACCENT)),
            Span::styled(
                format!(" {} / {}", format_time(pos.position), total),
                Style::default().fg(TEXT_SECONDARY),
            ),
        ]));
    }

    if let Some(next) = detail.and_then(|d| d.next_episode(&app.watch.episode_slug)) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Tập tiếp theo: {} (n)", next.name),
            Style::default().fg(TEXT_DIM),
        )));
    }

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT))
                .title(" Đang xem "),
        ),
        area,
    );
}
