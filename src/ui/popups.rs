use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::menu::{MenuSection, NavTarget};
use crate::toast::ToastKind;
use crate::ui::colors::{
    ACCENT, ERROR, GOLD, HIGHLIGHT_BG, SUCCESS, TEXT_DIM, TEXT_PRIMARY, TEXT_SECONDARY,
};
use crate::ui::utils::centered_rect;

const SHORTCUTS: &[(&str, &str)] = &[
    ("/  Ctrl+F", "Tìm kiếm"),
    ("j k  ↑ ↓", "Di chuyển"),
    ("Enter", "Chọn / phát"),
    ("Tab", "Đổi khung"),
    ("Esc  [  ]", "Quay lại / tiến tới"),
    ("m", "Menu thể loại"),
    ("h  l", "Trang chủ / thư viện"),
    ("f", "Yêu thích"),
    ("a", "Xem tất cả (trang chủ)"),
    ("n  p", "Trang sau / trước"),
    ("v  c", "Đổi server / xem tiếp"),
    ("i", "Viết bình luận"),
    ("x", "Dừng phát"),
    ("d  C", "Xóa mục / xóa lịch sử"),
    ("r", "Tải lại"),
    ("q", "Thoát"),
];

pub fn render_help_popup(f: &mut Frame, area: Rect) {
    let area = centered_rect(60, 70, area);
    f.render_widget(Clear, area);

    let lines: Vec<Line> = SHORTCUTS
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!("  {:<12}", keys), Style::default().fg(GOLD)),
                Span::styled(*action, Style::default().fg(TEXT_SECONDARY)),
            ])
        })
        .collect();

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Phím tắt ")
                .borders(Borders::ALL)
                .border_type(BorderType::Thick)
                .border_style(Style::default().fg(ACCENT)),
        ),
        area,
    );
}

/// Drawer on the left edge, like the site's mobile nav
pub fn render_menu(f: &mut Frame, app: &App, area: Rect) {
    let width = 30.min(area.width);
    let drawer = Rect::new(area.x, area.y, width, area.height);
    f.render_widget(Clear, drawer);

    let title = match app.menu.section {
        MenuSection::Main => " Menu ",
        MenuSection::Genres => " Thể loại ",
    };
    let items: Vec<ListItem> = app
        .menu
        .items()
        .iter()
        .map(|item| {
            let arrow = if item.target == NavTarget::Genres { " ›" } else { "" };
            ListItem::new(Line::from(vec![
                Span::styled(item.label, Style::default().fg(TEXT_PRIMARY)),
                Span::styled(arrow, Style::default().fg(TEXT_DIM)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.menu.selected));
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT)),
        )
        .highlight_style(Style::default().bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, drawer, &mut state);
}

/// Bottom-right notice; expiry is handled by `ToastState::tick`
pub fn render_toast(f: &mut Frame, app: &App, area: Rect) {
    let Some(toast) = &app.toasts.current else {
        return;
    };
    let (color, icon) = match toast.kind {
        ToastKind::Success => (SUCCESS, "✓"),
        ToastKind::Error => (ERROR, "✗"),
    };

    let width = (toast.message.chars().count() as u16 + 6).clamp(20, 60).min(area.width);
    let height = if toast.message.chars().count() as u16 + 6 > width { 4 } else { 3 };
    let rect = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height + 1),
        width,
        height.min(area.height),
    );
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", icon), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(toast.message.clone(), Style::default().fg(TEXT_PRIMARY)),
        ]))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color)),
        ),
        rect,
    );
}
