use binh_cinema_lib::api::{Episode, EpisodeServer, Movie, MovieDetail, Page, Pagination};
use binh_cinema_lib::app::{App, AsyncAction, Effect, FetchRequest, HomeSection};
use binh_cinema_lib::config::AppConfig;
use binh_cinema_lib::flex_num::FlexNum;
use binh_cinema_lib::player::PlaybackPosition;
use binh_cinema_lib::router::{Route, SearchQuery};
use binh_cinema_lib::ui;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::time::{Duration, Instant};

// ─── Helpers ───────────────────────────────────────────────────────────────────

fn make_movie(slug: &str, name: &str) -> Movie {
    Movie {
        slug: slug.to_string(),
        name: name.to_string(),
        origin_name: format!("{} Origin", name),
        year: FlexNum::new(2024),
        quality: Some("FHD".to_string()),
        ..Default::default()
    }
}

fn make_detail(slug: &str, name: &str, episodes: usize) -> MovieDetail {
    MovieDetail {
        movie: make_movie(slug, name),
        content: "<p>Mot cau chuyen &amp; hanh trinh</p>".to_string(),
        episodes: vec![EpisodeServer {
            server_name: "Vietsub #1".to_string(),
            server_data: (1..=episodes)
                .map(|i| Episode {
                    name: format!("Tap {:02}", i),
                    slug: format!("tap-{:02}", i),
                    link_m3u8: format!("https://stream.example/{}/{}.m3u8", slug, i),
                    link_embed: format!("https://player.example/{}/{}", slug, i),
                    ..Default::default()
                })
                .collect(),
        }],
        ..Default::default()
    }
}

fn make_page(items: Vec<Movie>, current: u64, total: u64) -> Page<Movie> {
    Page {
        items,
        pagination: Pagination {
            current_page: FlexNum::new(current),
            total_pages: FlexNum::new(total),
            ..Default::default()
        },
    }
}

/// Render one frame and return the screen as text; panics on crash
fn render_frame_sized(app: &mut App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|f| {
            ui::ui(f, app);
        })
        .unwrap();
    let buffer = terminal.backend().buffer().clone();
    buffer.content().iter().map(|c| c.symbol()).collect()
}

fn render_frame(app: &mut App) -> String {
    render_frame_sized(app, 120, 40)
}

fn loaded_home() -> App {
    let mut app = App::in_memory(AppConfig::default());
    app.start();
    app.apply_action(AsyncAction::HomeLoaded(vec![
        (HomeSection::Latest, Ok(vec![make_movie("alpha", "Alpha Movie")])),
        (HomeSection::Series, Ok(vec![make_movie("beta", "Beta Series")])),
        (HomeSection::Movies, Ok(vec![])),
        (HomeSection::Animation, Ok(vec![make_movie("gamma", "Gamma Toon")])),
    ]));
    app
}

// ─── Pages ─────────────────────────────────────────────────────────────────────

#[test]
fn test_home_screen_shows_sections() {
    let mut app = loaded_home();
    let screen = render_frame(&mut app);
    assert!(screen.contains("Alpha Movie"));
    assert!(screen.contains("Beta Series"));
    assert!(screen.contains("Gamma Toon"));
}

#[test]
fn test_home_screen_while_loading() {
    let mut app = App::in_memory(AppConfig::default());
    app.start();
    assert!(app.loading.is_some());
    render_frame(&mut app);
}

#[test]
fn test_browse_screen_shows_page_footer() {
    let mut app = App::in_memory(AppConfig::default());
    let query = SearchQuery::keyword("alpha");
    let effects = app.navigate(Route::Search(query.clone()));
    assert_eq!(effects, vec![Effect::Fetch(FetchRequest::Listing(query.clone()))]);

    app.apply_action(AsyncAction::PageLoaded(
        query,
        make_page(vec![make_movie("alpha", "Alpha Movie"), make_movie("alpha-2", "Alpha Two")], 2, 5),
    ));
    let screen = render_frame(&mut app);
    assert!(screen.contains("Alpha Two"));
    assert!(screen.contains("Trang 2/5"));
}

#[test]
fn test_details_screen_shows_episodes_and_synopsis() {
    let mut app = App::in_memory(AppConfig::default());
    app.navigate(Route::details("alpha"));
    app.apply_action(AsyncAction::DetailLoaded("alpha".into(), make_detail("alpha", "Alpha Movie", 3)));

    let screen = render_frame(&mut app);
    assert!(screen.contains("Alpha Movie"));
    assert!(screen.contains("Tap 03"));
    assert!(screen.contains("Vietsub #1"));
    assert!(screen.contains("Mot cau chuyen & hanh trinh"));
    assert!(!screen.contains("<p>"));
}

#[test]
fn test_details_screen_with_comment_box_open() {
    let mut app = App::in_memory(AppConfig::default());
    app.navigate(Route::details("alpha"));
    app.apply_action(AsyncAction::DetailLoaded("alpha".into(), make_detail("alpha", "Alpha Movie", 1)));
    app.comments.add("alpha", "Binh", "Great pacing").unwrap();

    app.begin_comment();
    let screen = render_frame(&mut app);
    assert!(screen.contains("Great pacing"));
    assert!(screen.contains("Binh"));
}

#[test]
fn test_watch_screen_shows_progress() {
    let mut app = App::in_memory(AppConfig::default());
    app.navigate(Route::watch("alpha", "tap-01"));
    let effects = app.apply_action(AsyncAction::DetailLoaded("alpha".into(), make_detail("alpha", "Alpha Movie", 2)));
    assert!(matches!(effects.as_slice(), [Effect::Play(_)]));

    app.apply_action(AsyncAction::PlayerStarted {
        slug: "alpha".into(),
        episode_slug: "tap-01".into(),
    });
    app.apply_action(AsyncAction::PlaybackProgress {
        slug: "alpha".into(),
        episode_slug: "tap-01".into(),
        position: PlaybackPosition {
            position: 65.0,
            duration: 1300.0,
        },
    });

    let screen = render_frame(&mut app);
    assert!(screen.contains("Alpha Movie"));
    assert!(screen.contains("1:05 / 21:40"));
    assert!(screen.contains("Tap 02 (n)"));
}

#[test]
fn test_library_screen_lists_history() {
    let mut app = App::in_memory(AppConfig::default());
    app.navigate(Route::watch("alpha", "tap-01"));
    app.apply_action(AsyncAction::DetailLoaded("alpha".into(), make_detail("alpha", "Alpha Movie", 2)));
    app.navigate(Route::Library);

    let screen = render_frame(&mut app);
    assert!(screen.contains("Alpha Movie"));
    assert!(screen.contains("Tap 01"));
}

// ─── Overlays ──────────────────────────────────────────────────────────────────

#[test]
fn test_search_dropdown_renders_under_box() {
    let mut app = loaded_home();
    app.begin_search();
    let t0 = Instant::now();
    app.search.set_query("gam", t0);
    let ticket = app.search.poll(t0 + Duration::from_secs(1)).unwrap();
    app.apply_action(AsyncAction::InstantResults(
        ticket.generation,
        vec![make_movie("gamma", "Gamma Toon"), make_movie("gamma-2", "Gamma Returns")],
    ));

    let screen = render_frame(&mut app);
    assert!(screen.contains("Gamma Returns"));
    assert!(app.area_dropdown.height > 0);
    assert_eq!(app.area_dropdown.y, app.area_search.y + app.area_search.height);

    app.search.dismiss();
    render_frame(&mut app);
    assert_eq!(app.area_dropdown.height, 0);
}

#[test]
fn test_menu_and_help_overlays() {
    let mut app = loaded_home();
    app.menu.toggle();
    let screen = render_frame(&mut app);
    assert!(screen.contains("Menu"));

    app.menu.close();
    app.show_help = true;
    let screen = render_frame(&mut app);
    assert!(screen.contains("Ctrl+F"));
}

#[test]
fn test_toast_for_bad_route() {
    let mut app = loaded_home();
    app.open_path("#/khong-ton-tai");
    assert_eq!(*app.route(), Route::Home);
    let screen = render_frame(&mut app);
    assert!(screen.contains("khong-ton-tai"));
}

#[test]
fn test_tiny_terminal_does_not_panic() {
    let mut app = loaded_home();
    app.menu.toggle();
    app.show_help = true;
    render_frame_sized(&mut app, 20, 6);
    render_frame_sized(&mut app, 1, 1);
}
