use std::io;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use binh_cinema_lib::api::CatalogClient;
use binh_cinema_lib::app::{App, AsyncAction};
use binh_cinema_lib::comments::CommentBoard;
use binh_cinema_lib::config::{self, AppConfig};
use binh_cinema_lib::handlers::async_actions::{handle_async_action, run_effects};
use binh_cinema_lib::handlers::input::handle_key_event;
use binh_cinema_lib::handlers::mouse::handle_mouse_event;
use binh_cinema_lib::library::Library;
use binh_cinema_lib::player::Player;
use binh_cinema_lib::storage::Store;
use binh_cinema_lib::{setup, ui};

/// Redraw at least this often so the loading spinner moves
const FRAME_MS: u64 = 100;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Terminal client for the BinhVietSub movie catalog", long_about = None)]
struct Args {
    /// Check the player binary and configuration, then exit
    #[arg(long)]
    check: bool,

    /// Print the top search results for a keyword and exit
    #[arg(short, long)]
    search: Option<String>,

    /// Start at a route, e.g. "#/phim/ten-phim"
    #[arg(short, long)]
    open: Option<String>,

    /// Override the catalog API base URL
    #[arg(long)]
    api_base: Option<String>,
}

/// Log to a daily file; the terminal belongs to the UI
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config::data_dir()?.join("logs");
    let file_appender = tracing_appender::rolling::daily(&log_dir, "binh-cinema.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(base) = args.api_base {
        config.api_base_url = base.trim_end_matches('/').to_string();
    }
    let _guard = init_logging(&config);
    info!("binh-cinema v{} starting", env!("CARGO_PKG_VERSION"));

    // -- CLI MODE --
    if args.check {
        if config::config_path().is_some_and(|p| !p.exists()) {
            config.save()?;
            println!("Wrote default config.");
        }
        setup::check_dependencies(&config)?;
        return Ok(());
    }

    let client = CatalogClient::from_config(&config);

    if let Some(keyword) = args.search {
        let page = client.search(&keyword, 1).await?;
        if page.items.is_empty() {
            println!("Không tìm thấy kết quả cho \"{}\".", keyword);
        }
        for movie in page.items.iter().take(config.instant_result_limit) {
            println!("{}  ({})  #/phim/{}", movie.name, movie.subtitle(), movie.slug);
        }
        return Ok(());
    }

    // -- TUI MODE (Default) --
    let (library, comments) = match Store::open_default() {
        Ok(store) => (
            Library::load(store.clone(), config.history_limit),
            CommentBoard::load(store),
        ),
        Err(e) => {
            warn!(error = %e, "no data directory, library will not persist");
            (Library::in_memory(config.history_limit), CommentBoard::in_memory())
        }
    };
    let player = Player::from_config(&config);
    let mut app = App::new(config, library, comments);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, mut rx) = mpsc::channel::<AsyncAction>(32);

    let initial = match args.open.as_deref() {
        Some(path) => app.open_path(path),
        None => app.start(),
    };
    run_effects(initial, &client, &player, &tx);

    let res = run_app(&mut terminal, &mut app, &client, &player, tx, &mut rx).await;

    player.stop();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "terminal loop failed");
        println!("{:?}", err);
    }
    info!("bye");

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &CatalogClient,
    player: &Player,
    tx: mpsc::Sender<AsyncAction>,
    rx: &mut mpsc::Receiver<AsyncAction>,
) -> Result<(), anyhow::Error> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        // Background results first, non-blocking
        while let Ok(action) = rx.try_recv() {
            handle_async_action(app, action, client, player, &tx);
        }

        // Sleep until input, the next timer, or the next frame
        let now = Instant::now();
        let frame = now + Duration::from_millis(FRAME_MS);
        let wake = app.next_deadline().map_or(frame, |d| d.min(frame));
        let timeout = wake.saturating_duration_since(now);

        if event::poll(timeout)? {
            let effects = match event::read()? {
                Event::Key(key) => handle_key_event(app, key),
                Event::Mouse(mouse) => handle_mouse_event(app, mouse),
                _ => Vec::new(),
            };
            run_effects(effects, client, player, &tx);
        }

        let effects = app.tick(Instant::now());
        run_effects(effects, client, player, &tx);
        app.loading_tick = app.loading_tick.wrapping_add(1);

        if app.should_quit {
            return Ok(());
        }
    }
}
