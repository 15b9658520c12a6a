use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::api::Movie;
use crate::ui::colors::{CYAN, GOLD, TEXT_DIM, TEXT_PRIMARY, TEXT_SECONDARY};

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// `h:mm:ss` past an hour, `m:ss` otherwise
pub fn format_time(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Text progress bar of `width` cells
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// One list row for a title: name, badges, subtitle
pub fn movie_line(movie: &Movie) -> Line<'static> {
    let mut spans = vec![Span::styled(
        movie.name.clone(),
        Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
    )];
    if let Some(q) = movie.quality.as_ref().filter(|q| !q.is_empty()) {
        spans.push(Span::styled(format!(" [{}]", q), Style::default().fg(GOLD)));
    }
    if let Some(lang) = movie.lang.as_ref().filter(|l| !l.is_empty()) {
        spans.push(Span::styled(format!(" {}", lang), Style::default().fg(CYAN)));
    }
    if let Some(ep) = movie.episode_current.as_ref().filter(|e| !e.is_empty()) {
        spans.push(Span::styled(format!(" · {}", ep), Style::default().fg(TEXT_SECONDARY)));
    }
    let subtitle = movie.subtitle();
    if !subtitle.is_empty() {
        spans.push(Span::styled(format!("  {}", subtitle), Style::default().fg(TEXT_DIM)));
    }
    Line::from(spans)
}

/// Synopses arrive as HTML fragments; keep the text
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(75.9), "1:15");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Phim &amp; truyện</p>"), "Phim & truyện");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(2.0, 3), "███");
        assert_eq!(progress_bar(0.0, 2), "░░");
    }
}
