use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tracing::{debug, info, warn};
use tui_input::Input;

use crate::api::{Episode, Listing, Movie, MovieDetail, Page, Pagination};
use crate::comments::CommentBoard;
use crate::config::AppConfig;
use crate::errors::{CatalogError, LoadingStage};
use crate::library::{HistoryItem, Library};
use crate::menu::MenuState;
use crate::player::{PlayRequest, PlaybackPosition};
use crate::router::{Navigator, Route, SearchQuery};
use crate::search::{InstantSearch, SearchTicket};
use crate::toast::ToastState;

/// Network work the handlers layer should run
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Home,
    Listing(SearchQuery),
    Detail(String),
    Instant(SearchTicket),
}

/// Side effects produced by state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(FetchRequest),
    Play(PlayRequest),
    OpenUrl(String),
    StopPlayer,
}

#[derive(Debug, Clone)]
pub enum AsyncAction {
    HomeLoaded(Vec<(HomeSection, Result<Vec<Movie>, CatalogError>)>),
    PageLoaded(SearchQuery, Page<Movie>),
    PageFailed(SearchQuery, CatalogError),
    /// Requested slug and the detail that came back for it
    DetailLoaded(String, MovieDetail),
    DetailFailed(String, CatalogError),
    InstantResults(u64, Vec<Movie>),
    InstantFailed(u64, String),
    PlayerStarted {
        slug: String,
        episode_slug: String,
    },
    PlayerFailed {
        slug: String,
        episode_slug: String,
        message: String,
    },
    PlaybackProgress {
        slug: String,
        episode_slug: String,
        position: PlaybackPosition,
    },
    PlaybackEnded {
        slug: String,
        episode_slug: String,
        position: Option<PlaybackPosition>,
    },
    Error(String),
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum InputMode {
    Normal,
    Search,
    Comment,
}

/// Rows on the home page, fetched together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeSection {
    Latest,
    Series,
    Movies,
    Animation,
}

impl HomeSection {
    pub const ALL: [HomeSection; 4] = [
        HomeSection::Latest,
        HomeSection::Series,
        HomeSection::Movies,
        HomeSection::Animation,
    ];

    pub fn listing(&self) -> Listing {
        match self {
            HomeSection::Latest => Listing::Latest,
            HomeSection::Series => Listing::Type("phim-bo".to_string()),
            HomeSection::Movies => Listing::Type("phim-le".to_string()),
            HomeSection::Animation => Listing::Type("hoat-hinh".to_string()),
        }
    }

    pub fn title(&self) -> String {
        self.listing().title()
    }

    /// The full listing behind "see all"
    pub fn route(&self) -> Route {
        match self.listing() {
            Listing::Type(t) => Route::Search(SearchQuery::kind(t)),
            _ => Route::Search(SearchQuery::default().with_page(1)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomeRow {
    pub section: HomeSection,
    pub items: Vec<Movie>,
    pub error: Option<String>,
    pub state: ListState,
}

#[derive(Debug, Clone)]
pub struct HomeState {
    pub rows: Vec<HomeRow>,
    pub focus: usize,
    pub loaded: bool,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            rows: HomeSection::ALL
                .iter()
                .map(|s| HomeRow {
                    section: *s,
                    items: Vec::new(),
                    error: None,
                    state: ListState::default(),
                })
                .collect(),
            focus: 0,
            loaded: false,
        }
    }
}

impl HomeState {
    fn needs_load(&self) -> bool {
        !self.loaded || self.rows.iter().any(|r| r.error.is_some())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrowseState {
    pub query: Option<SearchQuery>,
    pub items: Vec<Movie>,
    pub pagination: Pagination,
    pub list_state: ListState,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailFocus {
    #[default]
    Episodes,
    Comments,
}

#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub detail: Option<MovieDetail>,
    pub server: usize,
    pub episode_state: ListState,
    pub comment_state: ListState,
    pub focus: DetailFocus,
    pub error: Option<String>,
}

impl DetailState {
    pub fn is_for(&self, slug: &str) -> bool {
        self.detail.as_ref().is_some_and(|d| d.movie.slug == slug)
    }

    /// Episodes of the selected server
    pub fn episodes(&self) -> &[Episode] {
        self.detail
            .as_ref()
            .and_then(|d| d.episodes.get(self.server))
            .map(|s| s.server_data.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_episode(&self) -> Option<&Episode> {
        self.episode_state
            .selected()
            .and_then(|i| self.episodes().get(i))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackStatus {
    Idle,
    Starting,
    Playing,
    InBrowser,
    Ended,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct WatchState {
    pub slug: String,
    pub episode_slug: String,
    pub status: PlaybackStatus,
    pub position: Option<PlaybackPosition>,
}

impl Default for WatchState {
    fn default() -> Self {
        Self {
            slug: String::new(),
            episode_slug: String::new(),
            status: PlaybackStatus::Idle,
            position: None,
        }
    }
}

impl WatchState {
    fn is_for(&self, slug: &str, episode_slug: &str) -> bool {
        self.slug == slug && self.episode_slug == episode_slug
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryTab {
    #[default]
    History,
    Favorites,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryView {
    pub tab: LibraryTab,
    pub list_state: ListState,
}

pub struct App {
    pub config: AppConfig,
    pub nav: Navigator,
    pub input_mode: InputMode,
    pub should_quit: bool,
    pub show_help: bool,
    pub loading: Option<LoadingStage>,
    pub loading_tick: u64,

    pub search: InstantSearch,
    pub search_input: Input,
    pub comment_input: Input,
    pub toasts: ToastState,
    pub menu: MenuState,

    pub home: HomeState,
    pub browse: BrowseState,
    pub details: DetailState,
    pub watch: WatchState,
    pub library_view: LibraryView,

    pub library: Library,
    pub comments: CommentBoard,

    // Last rendered areas, for mouse hit-testing
    pub area_search: Rect,
    pub area_dropdown: Rect,
}

impl App {
    pub fn new(config: AppConfig, library: Library, comments: CommentBoard) -> App {
        let search = InstantSearch::new(
            Duration::from_millis(config.debounce_ms),
            config.instant_result_limit,
        );
        let toasts = ToastState::new(Duration::from_millis(config.toast_duration_ms));
        App {
            config,
            nav: Navigator::new(Route::Home),
            input_mode: InputMode::Normal,
            should_quit: false,
            show_help: false,
            loading: None,
            loading_tick: 0,
            search,
            search_input: Input::default(),
            comment_input: Input::default(),
            toasts,
            menu: MenuState::default(),
            home: HomeState::default(),
            browse: BrowseState::default(),
            details: DetailState::default(),
            watch: WatchState::default(),
            library_view: LibraryView::default(),
            library,
            comments,
            area_search: Rect::default(),
            area_dropdown: Rect::default(),
        }
    }

    /// App with nothing persisted, for tests and one-shot modes
    pub fn in_memory(config: AppConfig) -> App {
        let library = Library::in_memory(config.history_limit);
        App::new(config, library, CommentBoard::in_memory())
    }

    pub fn route(&self) -> &Route {
        self.nav.current()
    }

    /// Effects to load whatever the starting route shows
    pub fn start(&mut self) -> Vec<Effect> {
        self.enter_route()
    }

    pub fn navigate(&mut self, route: Route) -> Vec<Effect> {
        if self.nav.push(route) {
            self.enter_route()
        } else {
            self.menu.close();
            self.search.dismiss();
            Vec::new()
        }
    }

    /// Navigate to a hash path typed or passed on the command line
    pub fn open_path(&mut self, path: &str) -> Vec<Effect> {
        match Route::parse(path) {
            Ok(route) => self.navigate(route),
            Err(e) => {
                warn!(%path, error = %e, "rejected route");
                self.toasts.error(format!("Không mở được {}: {}", path, e), Instant::now());
                Vec::new()
            }
        }
    }

    pub fn go_back(&mut self) -> Vec<Effect> {
        if self.nav.back() {
            self.enter_route()
        } else {
            Vec::new()
        }
    }

    pub fn go_forward(&mut self) -> Vec<Effect> {
        if self.nav.forward() {
            self.enter_route()
        } else {
            Vec::new()
        }
    }

    fn enter_route(&mut self) -> Vec<Effect> {
        let route = self.nav.current().clone();
        info!(route = %route, "entering route");
        self.menu.close();
        self.search.dismiss();
        self.show_help = false;
        self.loading = None;
        self.input_mode = InputMode::Normal;

        match route {
            Route::Home => {
                self.home.focus = 0;
                for row in &mut self.home.rows {
                    reset_selection(&mut row.state, row.items.len());
                }
                if self.home.needs_load() {
                    self.loading = Some(LoadingStage::Home);
                    vec![Effect::Fetch(FetchRequest::Home)]
                } else {
                    Vec::new()
                }
            }
            Route::Search(query) => {
                self.browse = BrowseState {
                    query: Some(query.clone()),
                    ..Default::default()
                };
                self.loading = Some(LoadingStage::Listing {
                    title: query.listing().title(),
                });
                vec![Effect::Fetch(FetchRequest::Listing(query))]
            }
            Route::Details { slug } => {
                self.details.focus = DetailFocus::Episodes;
                if self.details.is_for(&slug) {
                    self.details.server = 0;
                    let len = self.details.episodes().len();
                    reset_selection(&mut self.details.episode_state, len);
                    let count = self.comments.count_for(&slug);
                    reset_selection(&mut self.details.comment_state, count);
                    Vec::new()
                } else {
                    self.request_detail(slug)
                }
            }
            Route::Watch { slug, episode_slug } => {
                self.watch = WatchState {
                    slug: slug.clone(),
                    episode_slug,
                    ..Default::default()
                };
                if self.details.is_for(&slug) {
                    self.start_episode()
                } else {
                    self.request_detail(slug)
                }
            }
            Route::Library => {
                let len = self.library_len();
                reset_selection(&mut self.library_view.list_state, len);
                Vec::new()
            }
        }
    }

    fn request_detail(&mut self, slug: String) -> Vec<Effect> {
        self.details = DetailState::default();
        self.loading = Some(LoadingStage::Details { slug: slug.clone() });
        vec![Effect::Fetch(FetchRequest::Detail(slug))]
    }

    /// Record the episode in history and hand it to the player
    fn start_episode(&mut self) -> Vec<Effect> {
        let slug = self.watch.slug.clone();
        let episode_slug = self.watch.episode_slug.clone();

        let found = self.details.detail.as_ref().and_then(|detail| {
            let (server, episode) = detail.find_episode(&episode_slug)?;
            let index = detail.episodes[server]
                .server_data
                .iter()
                .position(|ep| ep.slug == episode_slug)
                .unwrap_or(0);
            Some((server, index, episode.clone(), detail.movie.clone()))
        });
        let Some((server, index, episode, movie)) = found else {
            let message = format!("Không tìm thấy tập {}", episode_slug);
            self.watch.status = PlaybackStatus::Failed(message.clone());
            self.toasts.error(message, Instant::now());
            return Vec::new();
        };

        self.details.server = server;
        self.details.episode_state.select(Some(index));

        let resume = self.library.history.resume_position(&slug, &episode_slug);
        let known_duration = self
            .library
            .history
            .get(&slug)
            .filter(|h| h.episode_slug == episode_slug)
            .map(|h| h.duration)
            .unwrap_or(0.0);

        let poster = if movie.poster_url.is_empty() {
            movie.thumb_url.clone()
        } else {
            movie.poster_url.clone()
        };
        let item = HistoryItem {
            slug: slug.clone(),
            name: movie.name.clone(),
            poster,
            episode_name: episode.name.clone(),
            episode_slug: episode_slug.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            progress: resume.unwrap_or(0.0),
            duration: known_duration,
        };
        if let Err(e) = self.library.record_watch(item) {
            warn!(error = %e, "failed to save watch history");
        }
        self.watch.position = resume.map(|position| PlaybackPosition {
            position,
            duration: known_duration,
        });

        if !episode.link_m3u8.trim().is_empty() {
            self.watch.status = PlaybackStatus::Starting;
            self.loading = Some(LoadingStage::StartingPlayer {
                episode: episode.name.clone(),
            });
            vec![Effect::Play(PlayRequest {
                slug,
                episode_slug,
                title: movie.name,
                episode_name: episode.name,
                m3u8: episode.link_m3u8,
                embed: episode.link_embed,
                start: resume,
            })]
        } else if !episode.link_embed.trim().is_empty() {
            self.watch.status = PlaybackStatus::InBrowser;
            self.toasts.success("Đang mở trình duyệt", Instant::now());
            vec![Effect::OpenUrl(episode.link_embed)]
        } else {
            let message = "Tập phim chưa có nguồn phát".to_string();
            self.watch.status = PlaybackStatus::Failed(message.clone());
            self.toasts.error(message, Instant::now());
            Vec::new()
        }
    }

    /// Timers: expire toasts and fire the search debounce
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        self.toasts.tick(now);
        match self.search.poll(now) {
            Some(ticket) => vec![Effect::Fetch(FetchRequest::Instant(ticket))],
            None => Vec::new(),
        }
    }

    /// Earliest moment `tick` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.search.deadline(), self.toasts.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn apply_action(&mut self, action: AsyncAction) -> Vec<Effect> {
        match action {
            AsyncAction::HomeLoaded(results) => {
                let mut first_error = None;
                for (section, result) in results {
                    let Some(row) = self.home.rows.iter_mut().find(|r| r.section == section) else {
                        continue;
                    };
                    match result {
                        Ok(items) => {
                            row.items = items;
                            row.error = None;
                        }
                        Err(e) => {
                            warn!(?section, error = %e, "home section failed");
                            row.error = Some(e.to_string());
                            first_error.get_or_insert(e);
                        }
                    }
                    reset_selection(&mut row.state, row.items.len());
                }
                self.home.loaded = true;
                if *self.route() == Route::Home {
                    self.loading = None;
                }
                if let Some(e) = first_error {
                    self.toasts.error(e.user_message(), Instant::now());
                }
                Vec::new()
            }
            AsyncAction::PageLoaded(query, page) => {
                if *self.route() != Route::Search(query.clone()) {
                    debug!(?query, "dropping stale listing");
                    return Vec::new();
                }
                self.browse.items = page.items;
                self.browse.pagination = page.pagination;
                self.browse.error = None;
                reset_selection(&mut self.browse.list_state, self.browse.items.len());
                self.loading = None;
                Vec::new()
            }
            AsyncAction::PageFailed(query, error) => {
                if *self.route() != Route::Search(query) {
                    return Vec::new();
                }
                self.browse.error = Some(error.to_string());
                self.loading = None;
                self.toasts.error(error.user_message(), Instant::now());
                Vec::new()
            }
            AsyncAction::DetailLoaded(slug, mut detail) => {
                if self.route().slug() != Some(slug.as_str()) {
                    debug!(%slug, "dropping stale detail");
                    return Vec::new();
                }
                // Everything downstream is keyed by the slug the route asked for
                if detail.movie.slug != slug {
                    debug!(requested = %slug, returned = %detail.movie.slug, "catalog returned a different slug");
                    detail.movie.slug = slug.clone();
                }
                let comment_count = self.comments.count_for(&slug);
                self.details = DetailState {
                    detail: Some(detail),
                    ..Default::default()
                };
                let episode_count = self.details.episodes().len();
                reset_selection(&mut self.details.episode_state, episode_count);
                reset_selection(&mut self.details.comment_state, comment_count);
                self.loading = None;
                if matches!(self.route(), Route::Watch { .. }) {
                    self.start_episode()
                } else {
                    Vec::new()
                }
            }
            AsyncAction::DetailFailed(slug, error) => {
                if self.route().slug() != Some(slug.as_str()) {
                    return Vec::new();
                }
                self.details.error = Some(error.to_string());
                self.loading = None;
                if matches!(self.route(), Route::Watch { .. }) {
                    self.watch.status = PlaybackStatus::Failed(error.to_string());
                }
                self.toasts.error(error.user_message(), Instant::now());
                Vec::new()
            }
            AsyncAction::InstantResults(generation, items) => {
                self.search.apply_results(generation, items);
                Vec::new()
            }
            AsyncAction::InstantFailed(generation, error) => {
                self.search.apply_failure(generation, &error);
                Vec::new()
            }
            AsyncAction::PlayerStarted { slug, episode_slug } => {
                if self.watch.is_for(&slug, &episode_slug) {
                    self.watch.status = PlaybackStatus::Playing;
                    self.loading = None;
                }
                Vec::new()
            }
            AsyncAction::PlayerFailed {
                slug,
                episode_slug,
                message,
            } => {
                if !self.watch.is_for(&slug, &episode_slug) {
                    debug!(%slug, %episode_slug, %message, "dropping failure of superseded playback");
                    return Vec::new();
                }
                self.loading = None;
                self.watch.status = PlaybackStatus::Failed(message.clone());
                self.toasts.error(message, Instant::now());
                Vec::new()
            }
            AsyncAction::PlaybackProgress {
                slug,
                episode_slug,
                position,
            } => {
                self.save_progress(&slug, &episode_slug, position);
                if self.watch.is_for(&slug, &episode_slug) {
                    self.watch.position = Some(position);
                }
                Vec::new()
            }
            AsyncAction::PlaybackEnded {
                slug,
                episode_slug,
                position,
            } => {
                if let Some(position) = position {
                    self.save_progress(&slug, &episode_slug, position);
                }
                if self.watch.is_for(&slug, &episode_slug) {
                    self.watch.status = PlaybackStatus::Ended;
                    if position.is_some() {
                        self.watch.position = position;
                    }
                }
                Vec::new()
            }
            AsyncAction::Error(message) => {
                self.loading = None;
                self.toasts.error(message, Instant::now());
                Vec::new()
            }
        }
    }

    fn save_progress(&mut self, slug: &str, episode_slug: &str, position: PlaybackPosition) {
        match self
            .library
            .update_progress(slug, episode_slug, position.position, position.duration)
        {
            Ok(false) => debug!(%slug, %episode_slug, "progress for an episode not in history"),
            Ok(true) => {}
            Err(e) => warn!(error = %e, "failed to save progress"),
        }
    }

    // ---- selection ----

    fn library_len(&self) -> usize {
        match self.library_view.tab {
            LibraryTab::History => self.library.history.items.len(),
            LibraryTab::Favorites => self.library.favorites.items.len(),
        }
    }

    fn active_list(&mut self) -> Option<(&mut ListState, usize)> {
        match self.nav.current() {
            Route::Home => {
                let row = self.home.rows.get_mut(self.home.focus)?;
                let len = row.items.len();
                Some((&mut row.state, len))
            }
            Route::Search(_) => Some((&mut self.browse.list_state, self.browse.items.len())),
            Route::Details { slug } => {
                if self.details.focus == DetailFocus::Comments {
                    let len = self.comments.count_for(slug);
                    Some((&mut self.details.comment_state, len))
                } else {
                    let len = self.details.episodes().len();
                    Some((&mut self.details.episode_state, len))
                }
            }
            Route::Watch { .. } => {
                let len = self.details.episodes().len();
                Some((&mut self.details.episode_state, len))
            }
            Route::Library => {
                let len = self.library_len();
                Some((&mut self.library_view.list_state, len))
            }
        }
    }

    pub fn select_next(&mut self) {
        if let Some((state, len)) = self.active_list() {
            step(state, len, true);
        }
    }

    pub fn select_previous(&mut self) {
        if let Some((state, len)) = self.active_list() {
            step(state, len, false);
        }
    }

    /// Tab: next home row, episodes/comments, or library tab
    pub fn cycle_focus(&mut self) {
        match self.nav.current() {
            Route::Home => {
                self.home.focus = (self.home.focus + 1) % self.home.rows.len().max(1);
            }
            Route::Details { .. } => {
                self.details.focus = match self.details.focus {
                    DetailFocus::Episodes => DetailFocus::Comments,
                    DetailFocus::Comments => DetailFocus::Episodes,
                };
            }
            Route::Library => {
                self.library_view.tab = match self.library_view.tab {
                    LibraryTab::History => LibraryTab::Favorites,
                    LibraryTab::Favorites => LibraryTab::History,
                };
                let len = self.library_len();
                reset_selection(&mut self.library_view.list_state, len);
            }
            _ => {}
        }
    }

    pub fn selected_movie(&self) -> Option<Movie> {
        match self.nav.current() {
            Route::Home => {
                let row = self.home.rows.get(self.home.focus)?;
                row.state.selected().and_then(|i| row.items.get(i)).cloned()
            }
            Route::Search(_) => self
                .browse
                .list_state
                .selected()
                .and_then(|i| self.browse.items.get(i))
                .cloned(),
            Route::Details { .. } | Route::Watch { .. } => {
                self.details.detail.as_ref().map(|d| d.movie.clone())
            }
            Route::Library => {
                let i = self.library_view.list_state.selected()?;
                match self.library_view.tab {
                    LibraryTab::History => self.library.history.items.get(i).map(|h| Movie {
                        slug: h.slug.clone(),
                        name: h.name.clone(),
                        poster_url: h.poster.clone(),
                        ..Default::default()
                    }),
                    LibraryTab::Favorites => self.library.favorites.items.get(i).cloned(),
                }
            }
        }
    }

    /// Enter on the focused list
    pub fn activate(&mut self) -> Vec<Effect> {
        match self.nav.current().clone() {
            Route::Home | Route::Search(_) => match self.selected_movie() {
                Some(movie) => self.navigate(Route::details(movie.slug)),
                None => Vec::new(),
            },
            Route::Library => {
                let Some(i) = self.library_view.list_state.selected() else {
                    return Vec::new();
                };
                match self.library_view.tab {
                    LibraryTab::History => match self.library.history.items.get(i) {
                        Some(h) => {
                            let route = Route::watch(h.slug.clone(), h.episode_slug.clone());
                            self.navigate(route)
                        }
                        None => Vec::new(),
                    },
                    LibraryTab::Favorites => match self.library.favorites.items.get(i) {
                        Some(m) => {
                            let route = Route::details(m.slug.clone());
                            self.navigate(route)
                        }
                        None => Vec::new(),
                    },
                }
            }
            Route::Details { slug } => match self.details.focus {
                DetailFocus::Episodes => match self.details.selected_episode() {
                    Some(ep) => {
                        let route = Route::watch(slug, ep.slug.clone());
                        self.navigate(route)
                    }
                    None => Vec::new(),
                },
                DetailFocus::Comments => {
                    self.toggle_comment_like();
                    Vec::new()
                }
            },
            Route::Watch { slug, episode_slug } => {
                let Some(ep) = self.details.selected_episode().map(|e| e.slug.clone()) else {
                    return Vec::new();
                };
                if ep == episode_slug {
                    // Same episode: replay it in place
                    self.start_episode()
                } else {
                    self.navigate(Route::watch(slug, ep))
                }
            }
        }
    }

    /// "See all" for the focused home row
    pub fn open_home_section(&mut self) -> Vec<Effect> {
        match self.home.rows.get(self.home.focus) {
            Some(row) if *self.route() == Route::Home => {
                let route = row.section.route();
                self.navigate(route)
            }
            _ => Vec::new(),
        }
    }

    pub fn reload(&mut self) -> Vec<Effect> {
        if *self.route() == Route::Home {
            self.home.loaded = false;
        }
        if let Some(slug) = self.route().slug() {
            if !self.details.is_for(slug) || self.details.error.is_some() {
                self.details = DetailState::default();
            }
        }
        self.enter_route()
    }

    // ---- paging ----

    pub fn next_page(&mut self) -> Vec<Effect> {
        self.change_page(true)
    }

    pub fn previous_page(&mut self) -> Vec<Effect> {
        self.change_page(false)
    }

    fn change_page(&mut self, forward: bool) -> Vec<Effect> {
        let Route::Search(query) = self.nav.current().clone() else {
            return Vec::new();
        };
        let p = &self.browse.pagination;
        let target = if forward && p.has_next() {
            p.current() + 1
        } else if !forward && p.has_previous() {
            p.current() - 1
        } else {
            return Vec::new();
        };
        self.nav.replace(Route::Search(query.with_page(target)));
        self.enter_route()
    }

    // ---- details / watch ----

    pub fn next_server(&mut self) {
        let count = self.details.detail.as_ref().map_or(0, |d| d.episodes.len());
        if count < 2 {
            return;
        }
        self.details.server = (self.details.server + 1) % count;
        let len = self.details.episodes().len();
        reset_selection(&mut self.details.episode_state, len);
    }

    /// Resume the title from history, or start its first episode
    pub fn continue_watching(&mut self) -> Vec<Effect> {
        let Some(detail) = self.details.detail.as_ref() else {
            return Vec::new();
        };
        let slug = detail.movie.slug.clone();
        let episode = match self.library.history.get(&slug) {
            Some(h) => Some(h.episode_slug.clone()),
            None => detail.first_episode().map(|e| e.slug.clone()),
        };
        match episode {
            Some(ep) => self.navigate(Route::watch(slug, ep)),
            None => {
                self.toasts.error("Phim chưa có tập nào", Instant::now());
                Vec::new()
            }
        }
    }

    pub fn play_next_episode(&mut self) -> Vec<Effect> {
        let Route::Watch { slug, episode_slug } = self.nav.current().clone() else {
            return Vec::new();
        };
        let next = self
            .details
            .detail
            .as_ref()
            .and_then(|d| d.next_episode(&episode_slug))
            .map(|e| e.slug.clone());
        match next {
            Some(ep) => self.navigate(Route::watch(slug, ep)),
            None => {
                self.toasts.success("Đây là tập cuối", Instant::now());
                Vec::new()
            }
        }
    }

    pub fn stop_playback(&mut self) -> Vec<Effect> {
        match self.watch.status {
            PlaybackStatus::Starting | PlaybackStatus::Playing => {
                self.watch.status = PlaybackStatus::Ended;
                self.loading = None;
                vec![Effect::StopPlayer]
            }
            _ => Vec::new(),
        }
    }

    // ---- library ----

    pub fn toggle_favorite(&mut self) {
        let Some(movie) = self.selected_movie() else {
            return;
        };
        let now = Instant::now();
        match self.library.toggle_favorite(&movie) {
            Ok(true) => self.toasts.success(format!("Đã thêm {} vào yêu thích", movie.name), now),
            Ok(false) => self.toasts.success(format!("Đã bỏ {} khỏi yêu thích", movie.name), now),
            Err(e) => self.toasts.error(format!("Không lưu được: {}", e), now),
        }
        if *self.route() == Route::Library {
            let len = self.library_len();
            clamp_selection(&mut self.library_view.list_state, len);
        }
    }

    pub fn remove_selected_entry(&mut self) {
        if *self.route() != Route::Library {
            return;
        }
        let Some(movie) = self.selected_movie() else {
            return;
        };
        let result = match self.library_view.tab {
            LibraryTab::History => self.library.remove_history(&movie.slug),
            LibraryTab::Favorites => self.library.remove_favorite(&movie.slug),
        };
        if let Err(e) = result {
            self.toasts.error(format!("Không lưu được: {}", e), Instant::now());
        }
        let len = self.library_len();
        clamp_selection(&mut self.library_view.list_state, len);
    }

    pub fn clear_history(&mut self) {
        let now = Instant::now();
        match self.library.clear_history() {
            Ok(()) => self.toasts.success("Đã xoá lịch sử xem", now),
            Err(e) => self.toasts.error(format!("Không lưu được: {}", e), now),
        }
        if *self.route() == Route::Library {
            let len = self.library_len();
            clamp_selection(&mut self.library_view.list_state, len);
        }
    }

    // ---- search box ----

    pub fn begin_search(&mut self) {
        self.menu.close();
        self.input_mode = InputMode::Search;
        self.search.open = true;
    }

    /// Call after every edit of `search_input`
    pub fn on_search_edited(&mut self, now: Instant) {
        let value = self.search_input.value().to_string();
        self.search.set_query(&value, now);
    }

    pub fn submit_search(&mut self) -> Vec<Effect> {
        if let Some(movie) = self.search.choose_selected() {
            self.finish_search();
            return self.navigate(Route::details(movie.slug));
        }
        match self.search.submit() {
            // A typed hash path jumps straight to that page
            Some(path) if path.starts_with("#/") => {
                self.finish_search();
                self.open_path(&path)
            }
            Some(keyword) => {
                self.finish_search();
                self.navigate(Route::Search(SearchQuery::keyword(keyword)))
            }
            None => Vec::new(),
        }
    }

    fn finish_search(&mut self) {
        self.search.clear();
        self.search_input.reset();
        self.input_mode = InputMode::Normal;
    }

    /// Esc in the search box: close the dropdown first, then leave the box
    pub fn cancel_search(&mut self) {
        if self.search.is_visible() {
            self.search.dismiss();
        } else {
            self.input_mode = InputMode::Normal;
        }
    }

    /// Tab in the search box: take the best recent query
    pub fn complete_search(&mut self, now: Instant) {
        let suggestion = self.search.suggestions(self.search.query()).into_iter().next();
        if let Some(q) = suggestion {
            self.search_input = Input::new(q);
            self.on_search_edited(now);
        }
    }

    // ---- comments ----

    pub fn begin_comment(&mut self) {
        if matches!(self.route(), Route::Details { .. }) && self.details.detail.is_some() {
            self.input_mode = InputMode::Comment;
        }
    }

    pub fn cancel_comment(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_comment(&mut self) {
        let Some(slug) = self.route().slug().map(str::to_string) else {
            return;
        };
        let now = Instant::now();
        match self
            .comments
            .add(&slug, &self.config.comment_name, self.comment_input.value())
        {
            Ok(_) => {
                self.comment_input.reset();
                self.input_mode = InputMode::Normal;
                self.details.focus = DetailFocus::Comments;
                self.details.comment_state.select(Some(0));
                self.toasts.success("Đã gửi bình luận", now);
            }
            Err(e) => self.toasts.error(format!("Không gửi được bình luận: {}", e), now),
        }
    }

    pub fn toggle_comment_like(&mut self) {
        let Some(slug) = self.route().slug() else {
            return;
        };
        let id = self
            .details
            .comment_state
            .selected()
            .and_then(|i| self.comments.for_movie(slug).get(i).map(|c| c.id.clone()));
        if let Some(id) = id {
            if let Err(e) = self.comments.toggle_like(&id) {
                self.toasts.error(e.to_string(), Instant::now());
            }
        }
    }
}

/// Select the first row, or nothing for an empty list
fn reset_selection(state: &mut ListState, len: usize) {
    *state = ListState::default();
    if len > 0 {
        state.select(Some(0));
    }
}

fn clamp_selection(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

fn step(state: &mut ListState, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    let i = match (state.selected(), forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, _) => 0,
    };
    state.select(Some(i));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{EpisodeServer, Pagination};
    use crate::flex_num::FlexNum;

    fn movie(slug: &str) -> Movie {
        Movie {
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            ..Default::default()
        }
    }

    fn detail(slug: &str, episodes: &[(&str, &str, &str)]) -> MovieDetail {
        MovieDetail {
            movie: movie(slug),
            episodes: vec![EpisodeServer {
                server_name: "Vietsub #1".into(),
                server_data: episodes
                    .iter()
                    .map(|(ep, m3u8, embed)| Episode {
                        name: ep.to_uppercase(),
                        slug: ep.to_string(),
                        link_m3u8: m3u8.to_string(),
                        link_embed: embed.to_string(),
                        ..Default::default()
                    })
                    .collect(),
            }],
            ..Default::default()
        }
    }

    fn page(items: Vec<Movie>, current: u64, total: u64) -> Page<Movie> {
        Page {
            items,
            pagination: Pagination {
                current_page: FlexNum::new(current),
                total_pages: FlexNum::new(total),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_start_on_home_fetches_sections() {
        let mut app = App::in_memory(AppConfig::default());
        assert_eq!(app.start(), vec![Effect::Fetch(FetchRequest::Home)]);
        assert_eq!(app.loading, Some(LoadingStage::Home));

        app.apply_action(AsyncAction::HomeLoaded(vec![
            (HomeSection::Latest, Ok(vec![movie("a")])),
            (HomeSection::Series, Ok(vec![])),
        ]));
        assert!(app.loading.is_none());
        assert_eq!(app.home.rows[0].state.selected(), Some(0));
        assert!(app.home.rows[1].state.selected().is_none());

        // Coming back home does not refetch
        app.navigate(Route::Library);
        assert!(app.go_back().is_empty());
    }

    #[test]
    fn test_failed_home_section_is_retried() {
        let mut app = App::in_memory(AppConfig::default());
        app.start();
        app.apply_action(AsyncAction::HomeLoaded(vec![(
            HomeSection::Movies,
            Err(CatalogError::Timeout("u".into(), 15)),
        )]));
        assert!(app.toasts.current.is_some());
        app.navigate(Route::Library);
        assert_eq!(app.go_back(), vec![Effect::Fetch(FetchRequest::Home)]);
    }

    #[test]
    fn test_stale_listing_is_dropped() {
        let mut app = App::in_memory(AppConfig::default());
        let first = SearchQuery::keyword("one");
        app.navigate(Route::Search(first.clone()));
        app.navigate(Route::Search(SearchQuery::keyword("two")));

        app.apply_action(AsyncAction::PageLoaded(first, page(vec![movie("old")], 1, 1)));
        assert!(app.browse.items.is_empty());
        assert!(app.loading.is_some());
    }

    #[test]
    fn test_pagination_replaces_route() {
        let mut app = App::in_memory(AppConfig::default());
        let query = SearchQuery::kind("phim-bo");
        app.navigate(Route::Search(query.clone()));
        app.apply_action(AsyncAction::PageLoaded(query.clone(), page(vec![movie("a")], 1, 3)));

        let effects = app.next_page();
        assert_eq!(
            effects,
            vec![Effect::Fetch(FetchRequest::Listing(query.with_page(2)))]
        );
        assert_eq!(app.nav.depth(), 1);
        app.go_back();
        assert_eq!(*app.route(), Route::Home);
    }

    #[test]
    fn test_previous_page_stops_at_first() {
        let mut app = App::in_memory(AppConfig::default());
        let query = SearchQuery::kind("phim-le");
        app.navigate(Route::Search(query.clone()));
        app.apply_action(AsyncAction::PageLoaded(query, page(vec![movie("a")], 1, 3)));
        assert!(app.previous_page().is_empty());
    }

    #[test]
    fn test_watch_loads_detail_then_plays_with_resume() {
        let mut app = App::in_memory(AppConfig::default());
        app.library
            .record_watch(HistoryItem {
                slug: "a".into(),
                name: "A".into(),
                poster: String::new(),
                episode_name: "TAP-02".into(),
                episode_slug: "tap-02".into(),
                timestamp: 0,
                progress: 120.0,
                duration: 1500.0,
            })
            .unwrap();

        let effects = app.navigate(Route::watch("a", "tap-02"));
        assert_eq!(effects, vec![Effect::Fetch(FetchRequest::Detail("a".into()))]);

        let effects = app.apply_action(AsyncAction::DetailLoaded(
            "a".into(),
            detail("a", &[("tap-01", "https://s/1.m3u8", ""), ("tap-02", "https://s/2.m3u8", "")]),
        ));
        let [Effect::Play(req)] = effects.as_slice() else {
            panic!("expected a play effect, got {:?}", effects)
        };
        assert_eq!(req.m3u8, "https://s/2.m3u8");
        assert_eq!(req.start, Some(120.0));
        assert_eq!(app.details.episode_state.selected(), Some(1));
        assert_eq!(app.watch.status, PlaybackStatus::Starting);
        // Recording the watch keeps the saved position
        assert_eq!(app.library.history.items[0].progress, 120.0);
    }

    #[test]
    fn test_episode_without_stream_opens_embed() {
        let mut app = App::in_memory(AppConfig::default());
        app.navigate(Route::details("a"));
        app.apply_action(AsyncAction::DetailLoaded(
            "a".into(),
            detail("a", &[("full", "", "https://player/embed/1")]),
        ));
        let effects = app.activate();
        assert_eq!(effects, vec![Effect::OpenUrl("https://player/embed/1".into())]);
        assert_eq!(app.watch.status, PlaybackStatus::InBrowser);
        assert_eq!(app.library.history.items[0].episode_slug, "full");
    }

    #[test]
    fn test_unknown_episode_reports_error() {
        let mut app = App::in_memory(AppConfig::default());
        app.navigate(Route::watch("a", "tap-99"));
        let effects = app.apply_action(AsyncAction::DetailLoaded(
            "a".into(),
            detail("a", &[("tap-01", "https://s/1.m3u8", "")]),
        ));
        assert!(effects.is_empty());
        assert!(matches!(app.watch.status, PlaybackStatus::Failed(_)));
        assert!(app.library.history.items.is_empty());
    }

    #[test]
    fn test_detail_for_other_title_is_ignored() {
        let mut app = App::in_memory(AppConfig::default());
        app.navigate(Route::details("a"));
        app.navigate(Route::details("b"));
        app.apply_action(AsyncAction::DetailLoaded("a".into(), detail("a", &[])));
        assert!(app.details.detail.is_none());
    }

    #[test]
    fn test_detail_is_matched_by_requested_slug() {
        let mut app = App::in_memory(AppConfig::default());
        app.navigate(Route::details("ten-phim"));
        let mut d = detail("ten-phim", &[("tap-01", "https://s/1.m3u8", "")]);
        d.movie.slug = String::new();

        app.apply_action(AsyncAction::DetailLoaded("ten-phim".into(), d));
        assert!(app.loading.is_none());
        assert!(app.details.is_for("ten-phim"));
        // Revisiting does not refetch
        app.navigate(Route::Library);
        assert!(app.go_back().is_empty());
    }

    #[test]
    fn test_failure_of_superseded_playback_is_ignored() {
        let mut app = App::in_memory(AppConfig::default());
        app.navigate(Route::watch("a", "tap-02"));
        app.apply_action(AsyncAction::DetailLoaded(
            "a".into(),
            detail("a", &[("tap-01", "https://s/1.m3u8", ""), ("tap-02", "https://s/2.m3u8", "")]),
        ));
        app.apply_action(AsyncAction::PlayerFailed {
            slug: "a".into(),
            episode_slug: "tap-01".into(),
            message: "mpv đã thoát".into(),
        });
        assert_eq!(app.watch.status, PlaybackStatus::Starting);
        assert!(app.toasts.current.is_none());

        app.apply_action(AsyncAction::PlayerFailed {
            slug: "a".into(),
            episode_slug: "tap-02".into(),
            message: "mpv đã thoát".into(),
        });
        assert_eq!(app.watch.status, PlaybackStatus::Failed("mpv đã thoát".into()));
        assert!(app.loading.is_none());
    }

    #[test]
    fn test_progress_updates_history_and_watch() {
        let mut app = App::in_memory(AppConfig::default());
        app.navigate(Route::watch("a", "tap-01"));
        app.apply_action(AsyncAction::DetailLoaded(
            "a".into(),
            detail("a", &[("tap-01", "https://s/1.m3u8", "")]),
        ));
        app.apply_action(AsyncAction::PlayerStarted {
            slug: "a".into(),
            episode_slug: "tap-01".into(),
        });
        assert_eq!(app.watch.status, PlaybackStatus::Playing);

        let position = PlaybackPosition {
            position: 300.0,
            duration: 1400.0,
        };
        app.apply_action(AsyncAction::PlaybackProgress {
            slug: "a".into(),
            episode_slug: "tap-01".into(),
            position,
        });
        assert_eq!(app.watch.position, Some(position));
        assert_eq!(app.library.history.items[0].progress, 300.0);

        app.apply_action(AsyncAction::PlaybackEnded {
            slug: "a".into(),
            episode_slug: "tap-01".into(),
            position: None,
        });
        assert_eq!(app.watch.status, PlaybackStatus::Ended);
        assert_eq!(app.library.history.items[0].progress, 300.0);
    }

    #[test]
    fn test_instant_search_flow() {
        let mut app = App::in_memory(AppConfig::default());
        let t0 = Instant::now();
        app.begin_search();
        app.search_input = Input::new("naruto".into());
        app.on_search_edited(t0);
        assert!(app.tick(t0 + Duration::from_millis(100)).is_empty());

        let effects = app.tick(t0 + Duration::from_millis(300));
        let [Effect::Fetch(FetchRequest::Instant(ticket))] = effects.as_slice() else {
            panic!("expected instant fetch, got {:?}", effects)
        };
        assert_eq!(ticket.query, "naruto");

        app.apply_action(AsyncAction::InstantResults(ticket.generation, vec![movie("naruto")]));
        assert!(app.search.is_visible());

        app.search.select_next();
        let effects = app.submit_search();
        assert_eq!(effects, vec![Effect::Fetch(FetchRequest::Detail("naruto".into()))]);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.search_input.value(), "");
    }

    #[test]
    fn test_submit_without_selection_searches_keyword() {
        let mut app = App::in_memory(AppConfig::default());
        app.begin_search();
        app.search_input = Input::new("  tinh yeu ".into());
        app.on_search_edited(Instant::now());
        let effects = app.submit_search();
        let expected = SearchQuery::keyword("tinh yeu");
        assert_eq!(effects, vec![Effect::Fetch(FetchRequest::Listing(expected.clone()))]);
        assert_eq!(*app.route(), Route::Search(expected));
    }

    #[test]
    fn test_bad_path_shows_toast_and_stays() {
        let mut app = App::in_memory(AppConfig::default());
        assert!(app.open_path("/khong-co").is_empty());
        assert_eq!(*app.route(), Route::Home);
        assert!(app.toasts.current.is_some());
    }

    #[test]
    fn test_favorite_toggle_from_details() {
        let mut app = App::in_memory(AppConfig::default());
        app.navigate(Route::details("a"));
        app.apply_action(AsyncAction::DetailLoaded("a".into(), detail("a", &[])));
        app.toggle_favorite();
        assert!(app.library.favorites.contains("a"));
        app.toggle_favorite();
        assert!(!app.library.favorites.contains("a"));
    }

    #[test]
    fn test_comment_submit_and_like() {
        let mut app = App::in_memory(AppConfig::default());
        app.navigate(Route::details("a"));
        app.apply_action(AsyncAction::DetailLoaded("a".into(), detail("a", &[])));
        app.begin_comment();
        assert_eq!(app.input_mode, InputMode::Comment);
        app.comment_input = Input::new("Phim hay".into());
        app.submit_comment();
        assert_eq!(app.comments.count_for("a"), 1);
        assert_eq!(app.details.focus, DetailFocus::Comments);

        app.activate();
        assert_eq!(app.comments.for_movie("a")[0].likes, 1);
    }

    #[test]
    fn test_route_change_resets_selection() {
        let mut app = App::in_memory(AppConfig::default());
        let q = SearchQuery::keyword("abc");
        app.navigate(Route::Search(q.clone()));
        app.apply_action(AsyncAction::PageLoaded(q, page(vec![movie("a"), movie("b")], 1, 1)));
        app.select_next();
        assert_eq!(app.browse.list_state.selected(), Some(1));
        app.activate();
        app.go_back();
        assert!(app.browse.list_state.selected().is_none());
    }

    #[test]
    fn test_next_deadline_is_earliest_timer() {
        let mut app = App::in_memory(AppConfig::default());
        let t0 = Instant::now();
        assert!(app.next_deadline().is_none());
        app.toasts.success("hi", t0);
        app.search_input = Input::new("phim".into());
        app.on_search_edited(t0);
        assert_eq!(app.next_deadline(), Some(t0 + Duration::from_millis(300)));
    }
}
