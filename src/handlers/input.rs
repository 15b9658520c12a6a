use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tui_input::backend::crossterm::EventHandler;

use crate::app::{App, Effect, InputMode};
use crate::router::Route;

/// Translate one key press into state changes; returns effects to run
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    // Only process key press events, not release (Windows sends both)
    if key.kind != KeyEventKind::Press {
        return Vec::new();
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Vec::new();
    }

    match app.input_mode {
        InputMode::Search => return handle_search_keys(app, key),
        InputMode::Comment => {
            handle_comment_keys(app, key);
            return Vec::new();
        }
        InputMode::Normal => {}
    }

    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return Vec::new();
    }

    if app.menu.open {
        return handle_menu_keys(app, key);
    }

    let is_ctrl_f = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('f');
    if is_ctrl_f || key.code == KeyCode::Char('/') {
        app.begin_search();
        return Vec::new();
    }

    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            Vec::new()
        }
        KeyCode::Char('?') => {
            app.show_help = true;
            Vec::new()
        }
        KeyCode::Char('m') => {
            app.menu.toggle();
            Vec::new()
        }
        KeyCode::Esc => {
            if app.search.is_visible() {
                app.search.dismiss();
                Vec::new()
            } else {
                app.go_back()
            }
        }
        KeyCode::Backspace | KeyCode::Char('[') => app.go_back(),
        KeyCode::Char(']') => app.go_forward(),
        KeyCode::Left if key.modifiers.contains(KeyModifiers::ALT) => app.go_back(),
        KeyCode::Right if key.modifiers.contains(KeyModifiers::ALT) => app.go_forward(),
        KeyCode::Char('h') => app.navigate(Route::Home),
        KeyCode::Char('l') => app.navigate(Route::Library),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Down | KeyCode::Char('j') => {
            app.select_next();
            Vec::new()
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.select_previous();
            Vec::new()
        }
        KeyCode::Tab => {
            app.cycle_focus();
            Vec::new()
        }
        KeyCode::Enter => app.activate(),
        KeyCode::Char('f') => {
            app.toggle_favorite();
            Vec::new()
        }
        _ => handle_route_keys(app, key),
    }
}

/// Keys that only mean something on one page
fn handle_route_keys(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    match (app.route().clone(), key.code) {
        (Route::Home, KeyCode::Char('a')) => app.open_home_section(),
        (Route::Search(_), KeyCode::Right | KeyCode::Char('n')) => app.next_page(),
        (Route::Search(_), KeyCode::Left | KeyCode::Char('p')) => app.previous_page(),
        (Route::Details { .. }, KeyCode::Char('v')) => {
            app.next_server();
            Vec::new()
        }
        (Route::Details { .. }, KeyCode::Char('c')) => app.continue_watching(),
        (Route::Details { .. }, KeyCode::Char('i')) => {
            app.begin_comment();
            Vec::new()
        }
        (Route::Watch { .. }, KeyCode::Char('n')) => app.play_next_episode(),
        (Route::Watch { .. }, KeyCode::Char('x')) => app.stop_playback(),
        (Route::Library, KeyCode::Char('d') | KeyCode::Delete) => {
            app.remove_selected_entry();
            Vec::new()
        }
        (Route::Library, KeyCode::Char('C')) => {
            app.clear_history();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn handle_menu_keys(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    match key.code {
        KeyCode::Esc => app.menu.back(),
        KeyCode::Char('m') => app.menu.close(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Up | KeyCode::Char('k') => app.menu.previous(),
        KeyCode::Enter => {
            if let Some(route) = app.menu.activate() {
                return app.navigate(route);
            }
        }
        _ => {}
    }
    Vec::new()
}

fn handle_search_keys(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => return app.submit_search(),
        KeyCode::Down => app.search.select_next(),
        KeyCode::Up => app.search.select_previous(),
        KeyCode::Tab => app.complete_search(Instant::now()),
        _ => {
            if app.search_input.handle_event(&Event::Key(key)).is_some() {
                app.on_search_edited(Instant::now());
            }
        }
    }
    Vec::new()
}

fn handle_comment_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_comment(),
        KeyCode::Enter => app.submit_comment(),
        _ => {
            app.comment_input.handle_event(&Event::Key(key));
        }
    }
}
