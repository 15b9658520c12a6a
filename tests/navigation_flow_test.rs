use binh_cinema_lib::api::{Episode, EpisodeServer, Movie, MovieDetail};
use binh_cinema_lib::app::{App, AsyncAction, Effect, FetchRequest, HomeSection, PlaybackStatus};
use binh_cinema_lib::comments::CommentBoard;
use binh_cinema_lib::config::AppConfig;
use binh_cinema_lib::handlers::input::handle_key_event;
use binh_cinema_lib::library::Library;
use binh_cinema_lib::player::PlaybackPosition;
use binh_cinema_lib::router::Route;
use binh_cinema_lib::storage::Store;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn press(app: &mut App, code: KeyCode) -> Vec<Effect> {
    handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE))
}

fn movie(slug: &str) -> Movie {
    Movie {
        slug: slug.to_string(),
        name: format!("Phim {}", slug),
        ..Default::default()
    }
}

fn detail(slug: &str) -> MovieDetail {
    MovieDetail {
        movie: movie(slug),
        episodes: vec![EpisodeServer {
            server_name: "Vietsub #1".to_string(),
            server_data: vec![
                Episode {
                    name: "Tap 01".into(),
                    slug: "tap-01".into(),
                    link_m3u8: "https://s/1.m3u8".into(),
                    link_embed: "https://e/1".into(),
                    ..Default::default()
                },
                Episode {
                    name: "Tap 02".into(),
                    slug: "tap-02".into(),
                    link_m3u8: "https://s/2.m3u8".into(),
                    link_embed: "https://e/2".into(),
                    ..Default::default()
                },
            ],
        }],
        ..Default::default()
    }
}

fn app_with_store(dir: &std::path::Path) -> App {
    let config = AppConfig::default();
    let store = Store::open(dir).unwrap();
    let library = Library::load(store.clone(), config.history_limit);
    let comments = CommentBoard::load(store);
    App::new(config, library, comments)
}

#[test]
fn test_home_to_watch_with_keyboard() {
    let mut app = App::in_memory(AppConfig::default());
    assert_eq!(app.start(), vec![Effect::Fetch(FetchRequest::Home)]);
    app.apply_action(AsyncAction::HomeLoaded(vec![(
        HomeSection::Latest,
        Ok(vec![movie("a"), movie("b")]),
    )]));

    press(&mut app, KeyCode::Down);
    let effects = press(&mut app, KeyCode::Enter);
    assert_eq!(effects, vec![Effect::Fetch(FetchRequest::Detail("b".into()))]);
    assert_eq!(*app.route(), Route::details("b"));

    app.apply_action(AsyncAction::DetailLoaded("b".into(), detail("b")));
    press(&mut app, KeyCode::Char('j'));
    let effects = press(&mut app, KeyCode::Enter);
    assert_eq!(*app.route(), Route::watch("b", "tap-02"));
    match effects.as_slice() {
        [Effect::Play(req)] => {
            assert_eq!(req.m3u8, "https://s/2.m3u8");
            assert_eq!(req.embed, "https://e/2");
            assert_eq!(req.start, None);
        }
        other => panic!("expected a play effect, got {:?}", other),
    }
    assert_eq!(app.watch.status, PlaybackStatus::Starting);

    // Back to details reuses the loaded title
    assert!(press(&mut app, KeyCode::Esc).is_empty());
    assert_eq!(*app.route(), Route::details("b"));
    assert!(app.details.is_for("b"));
}

#[test]
fn test_history_survives_restart_and_resumes() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut app = app_with_store(dir.path());
        app.navigate(Route::watch("a", "tap-01"));
        app.apply_action(AsyncAction::DetailLoaded("a".into(), detail("a")));
        app.apply_action(AsyncAction::PlaybackEnded {
            slug: "a".into(),
            episode_slug: "tap-01".into(),
            position: Some(PlaybackPosition {
                position: 300.0,
                duration: 1400.0,
            }),
        });
        press(&mut app, KeyCode::Char('f'));
    }

    let mut app = app_with_store(dir.path());
    let entry = app.library.history.get("a").cloned().unwrap();
    assert_eq!(entry.episode_slug, "tap-01");
    assert_eq!(entry.progress, 300.0);
    assert!(app.library.favorites.contains("a"));

    // Continue from the library resumes at the saved position
    app.navigate(Route::Library);
    let effects = press(&mut app, KeyCode::Enter);
    assert_eq!(effects, vec![Effect::Fetch(FetchRequest::Detail("a".into()))]);
    let effects = app.apply_action(AsyncAction::DetailLoaded("a".into(), detail("a")));
    match effects.as_slice() {
        [Effect::Play(req)] => assert_eq!(req.start, Some(300.0)),
        other => panic!("expected a play effect, got {:?}", other),
    }
}
