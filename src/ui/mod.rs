pub mod browse;
pub mod colors;
pub mod details;
pub mod footer;
pub mod header;
pub mod home;
pub mod library;
pub mod loading;
pub mod popups;
pub mod utils;
pub mod watch;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::app::App;
use crate::router::Route;

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Page
            Constraint::Length(1), // Footer
        ])
        .split(area);

    header::render_header(f, app, chunks[0]);
    footer::render_footer(f, app, chunks[2]);

    let content = chunks[1];
    match app.route().clone() {
        Route::Home => home::render_home(f, app, content),
        Route::Search(_) => browse::render_browse(f, app, content),
        Route::Details { .. } => details::render_details(f, app, content),
        Route::Watch { .. } => watch::render_watch(f, app, content),
        Route::Library => library::render_library(f, app, content),
    }

    // Overlays, bottom to top
    header::render_search_dropdown(f, app, area);
    if app.menu.open {
        popups::render_menu(f, app, content);
    }
    if let Some(stage) = app.loading.clone() {
        loading::render_loading(f, app, &stage, content);
    }
    if app.show_help {
        popups::render_help_popup(f, area);
    }
    popups::render_toast(f, app, area);
}
