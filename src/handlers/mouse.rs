use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, Effect};

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.search.is_visible() && contains(app.area_dropdown, x, y) {
                // Rows start below the top border
                if y > app.area_dropdown.y {
                    let row = (y - app.area_dropdown.y - 1) as usize;
                    if row < app.search.results.len() {
                        app.search.selected = Some(row);
                        return app.submit_search();
                    }
                }
            } else if contains(app.area_search, x, y) {
                app.begin_search();
            } else {
                // Click outside closes the dropdown but keeps the query
                app.search.dismiss();
            }
            Vec::new()
        }
        MouseEventKind::ScrollDown => {
            if app.menu.open {
                app.menu.next();
            } else if app.search.is_visible() {
                app.search.select_next();
            } else {
                app.select_next();
            }
            Vec::new()
        }
        MouseEventKind::ScrollUp => {
            if app.menu.open {
                app.menu.previous();
            } else if app.search.is_visible() {
                app.search.select_previous();
            } else {
                app.select_previous();
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Movie;
    use crate::app::FetchRequest;
    use crate::config::AppConfig;
    use crossterm::event::KeyModifiers;
    use std::time::{Duration, Instant};

    fn click(x: u16, y: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: x,
            row: y,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn app_with_dropdown() -> App {
        let mut app = App::in_memory(AppConfig::default());
        let t0 = Instant::now();
        app.search.set_query("phim", t0);
        let ticket = app.search.poll(t0 + Duration::from_secs(1)).unwrap();
        app.search.apply_results(
            ticket.generation,
            vec![
                Movie {
                    slug: "a".into(),
                    ..Default::default()
                },
                Movie {
                    slug: "b".into(),
                    ..Default::default()
                },
            ],
        );
        app.area_search = Rect::new(10, 0, 40, 3);
        app.area_dropdown = Rect::new(10, 3, 40, 4);
        app
    }

    #[test]
    fn test_click_outside_dismisses_dropdown() {
        let mut app = app_with_dropdown();
        handle_mouse_event(&mut app, click(70, 20));
        assert!(!app.search.is_visible());
        assert_eq!(app.search.query(), "phim");
    }

    #[test]
    fn test_click_on_dropdown_border_does_nothing() {
        let mut app = app_with_dropdown();
        let effects = handle_mouse_event(&mut app, click(15, 3));
        assert!(effects.is_empty());
        assert!(app.search.is_visible());
        assert_eq!(app.search.selected, None);
    }

    #[test]
    fn test_click_on_result_opens_details() {
        let mut app = app_with_dropdown();
        let effects = handle_mouse_event(&mut app, click(15, 5));
        assert_eq!(effects, vec![Effect::Fetch(FetchRequest::Detail("b".into()))]);
    }
}
