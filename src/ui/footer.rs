use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, InputMode, LibraryTab};
use crate::router::Route;
use crate::ui::colors::{CYAN, TEXT_DIM, TEXT_SECONDARY};

fn hints(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.input_mode {
        InputMode::Search => {
            return vec![
                ("Enter", "Tìm"),
                ("↑↓", "Chọn kết quả"),
                ("Tab", "Gợi ý"),
                ("Esc", "Đóng"),
            ]
        }
        InputMode::Comment => return vec![("Enter", "Gửi"), ("Esc", "Huỷ")],
        InputMode::Normal => {}
    }

    let mut keys = vec![("q", "Thoát"), ("/", "Tìm"), ("m", "Menu"), ("Esc", "Quay lại")];
    match app.route() {
        Route::Home => {
            keys.push(("Tab", "Đổi mục"));
            keys.push(("a", "Xem tất cả"));
        }
        Route::Search(_) => {
            keys.push(("←→", "Trang"));
        }
        Route::Details { .. } => {
            keys.push(("c", "Xem tiếp"));
            keys.push(("v", "Đổi server"));
            keys.push(("i", "Bình luận"));
            keys.push(("f", "Yêu thích"));
        }
        Route::Watch { .. } => {
            keys.push(("n", "Tập sau"));
            keys.push(("x", "Dừng"));
        }
        Route::Library => {
            keys.push(("Tab", "Đổi tab"));
            keys.push(("d", "Xoá"));
            if app.library_view.tab == LibraryTab::History {
                keys.push(("C", "Xoá hết"));
            }
        }
    }
    keys.push(("?", "Trợ giúp"));
    keys
}

pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(CYAN).add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(TEXT_SECONDARY);

    let mut spans = Vec::new();
    for (key, label) in hints(app) {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!("{}  ", label), label_style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Left), area);

    let saved = format!(
        "{} đã xem · {} yêu thích ",
        app.library.history.items.len(),
        app.library.favorites.items.len()
    );
    f.render_widget(
        Paragraph::new(saved)
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Right),
        area,
    );
}
