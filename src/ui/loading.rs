use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::errors::LoadingStage;
use crate::ui::colors::{ACCENT, ACCENT_SOFT, BORDER, TEXT_DIM, TEXT_PRIMARY};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Film strip that scrolls one frame every other tick
fn film_strip(width: u16, tick: u64) -> Line<'static> {
    let spans = (0..width as u64)
        .map(|i| {
            let lit = (i + tick / 2) % 6 == 0;
            Span::styled(
                if lit { "▮" } else { "▯" },
                Style::default().fg(if lit { ACCENT } else { BORDER }),
            )
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

pub fn render_loading(f: &mut Frame, app: &App, stage: &LoadingStage, area: Rect) {
    let width = area.width.min(50);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + area.height.saturating_sub(6) / 2,
        width,
        6.min(area.height),
    );
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_SOFT));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let tick = app.loading_tick;
    let spinner = SPINNER[(tick % SPINNER.len() as u64) as usize];
    let dots = ".".repeat(((tick / 8) % 4) as usize);

    f.render_widget(film_strip(rows[0].width, tick), rows[0]);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", spinner), Style::default().fg(ACCENT)),
            Span::styled(
                format!("{}{}", stage.display_name(), dots),
                Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
            ),
        ]))
        .alignment(Alignment::Center),
        rows[2],
    );
    f.render_widget(
        Paragraph::new("Esc để quay lại")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center),
        rows[3],
    );
}
