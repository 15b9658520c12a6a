use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::CatalogError;
use crate::flex_num::FlexNum;

pub const DEFAULT_API_BASE: &str = "https://phimapi.com";
pub const DEFAULT_IMAGE_BASE: &str = "https://phimimg.com";
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Movie {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub origin_name: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub thumb_url: String,
    #[serde(default)]
    pub year: FlexNum,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub episode_current: Option<String>,
}

impl Movie {
    /// "Origin name • 2024" line used under titles
    pub fn subtitle(&self) -> String {
        match (self.origin_name.is_empty(), self.year.is_known()) {
            (false, true) => format!("{} \u{2022} {}", self.origin_name, self.year),
            (false, false) => self.origin_name.clone(),
            (true, true) => self.year.to_string(),
            (true, false) => String::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    #[serde(rename = "series")]
    Series,
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "hoathinh")]
    Animation,
    #[serde(rename = "tvshows")]
    TvShows,
    #[default]
    #[serde(other, rename = "other")]
    Other,
}

impl ContentKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ContentKind::Series => "Phim bộ",
            ContentKind::Single => "Phim lẻ",
            ContentKind::Animation => "Hoạt hình",
            ContentKind::TvShows => "TV Shows",
            ContentKind::Other => "Khác",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Taxon {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Episode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub link_embed: String,
    #[serde(default)]
    pub link_m3u8: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct EpisodeServer {
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub server_data: Vec<Episode>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: ContentKind,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub trailer_url: String,
    #[serde(default)]
    pub actor: Vec<String>,
    #[serde(default)]
    pub director: Vec<String>,
    #[serde(default)]
    pub category: Vec<Taxon>,
    #[serde(default)]
    pub country: Vec<Taxon>,
    #[serde(default)]
    pub episodes: Vec<EpisodeServer>,
}

impl MovieDetail {
    /// First episode with this slug across all servers, with its server index
    pub fn find_episode(&self, episode_slug: &str) -> Option<(usize, &Episode)> {
        self.episodes.iter().enumerate().find_map(|(si, server)| {
            server
                .server_data
                .iter()
                .find(|ep| ep.slug == episode_slug)
                .map(|ep| (si, ep))
        })
    }

    pub fn first_episode(&self) -> Option<&Episode> {
        self.episodes.iter().flat_map(|s| s.server_data.iter()).next()
    }

    /// Episode following `episode_slug` on the same server
    pub fn next_episode(&self, episode_slug: &str) -> Option<&Episode> {
        let (si, _) = self.find_episode(episode_slug)?;
        let data = &self.episodes[si].server_data;
        let pos = data.iter().position(|ep| ep.slug == episode_slug)?;
        data.get(pos + 1)
    }

    /// Actors without the blank entries the catalog likes to send
    pub fn cast(&self) -> Vec<&str> {
        self.actor
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_items: FlexNum,
    #[serde(default)]
    pub total_items_per_page: FlexNum,
    #[serde(default)]
    pub current_page: FlexNum,
    #[serde(default)]
    pub total_pages: FlexNum,
}

impl Pagination {
    pub fn current(&self) -> u32 {
        (self.current_page.get() as u32).max(1)
    }

    /// Total pages, derived from the item counts when the API leaves it out
    pub fn total_pages(&self) -> u32 {
        let explicit = self.total_pages.get() as u32;
        if explicit > 0 {
            return explicit;
        }
        let per_page = self.total_items_per_page.get();
        if per_page == 0 {
            return self.current();
        }
        let total = self.total_items.get().div_ceil(per_page) as u32;
        total.max(self.current())
    }

    pub fn has_next(&self) -> bool {
        self.current() < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.current() > 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// What a listing request fetches
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Listing {
    Latest,
    Search(String),
    Type(String),
    Category(String),
}

impl Listing {
    pub fn title(&self) -> String {
        match self {
            Listing::Latest => "Phim mới cập nhật".to_string(),
            Listing::Search(q) => format!("Kết quả tìm kiếm: {}", q),
            Listing::Type(t) => crate::menu::type_display_name(t)
                .map(str::to_string)
                .unwrap_or_else(|| t.clone()),
            Listing::Category(c) => crate::menu::genre_display_name(c)
                .map(|n| format!("Thể loại: {}", n))
                .unwrap_or_else(|| format!("Thể loại: {}", c)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageEnvelope {
    V1 {
        data: V1Data,
    },
    Legacy {
        items: Option<Vec<Movie>>,
        #[serde(default)]
        pagination: Pagination,
    },
}

#[derive(Deserialize)]
struct V1Data {
    #[serde(default)]
    items: Option<Vec<Movie>>,
    #[serde(default)]
    params: V1Params,
}

#[derive(Deserialize, Default)]
struct V1Params {
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Deserialize)]
struct DetailEnvelope {
    #[serde(default)]
    status: serde_json::Value,
    movie: Option<MovieDetail>,
    #[serde(default)]
    episodes: Vec<EpisodeServer>,
}

/// Decode either page envelope the catalog uses into one shape
pub fn parse_page(body: &str) -> Result<Page<Movie>, CatalogError> {
    let envelope: PageEnvelope =
        serde_json::from_str(body).map_err(|e| CatalogError::ParseError(e.to_string()))?;
    let page = match envelope {
        PageEnvelope::V1 { data } => Page {
            items: data.items.unwrap_or_default(),
            pagination: data.params.pagination,
        },
        PageEnvelope::Legacy { items, pagination } => Page {
            items: items.unwrap_or_default(),
            pagination,
        },
    };
    Ok(page)
}

pub fn parse_detail(slug: &str, body: &str) -> Result<MovieDetail, CatalogError> {
    let envelope: DetailEnvelope =
        serde_json::from_str(body).map_err(|e| CatalogError::ParseError(e.to_string()))?;
    if envelope.status == serde_json::Value::Bool(false) {
        return Err(CatalogError::NotFound(slug.to_string()));
    }
    let mut detail = envelope
        .movie
        .ok_or_else(|| CatalogError::NotFound(slug.to_string()))?;
    if !envelope.episodes.is_empty() {
        detail.episodes = envelope.episodes;
    }
    Ok(detail)
}

/// Join a catalog image path onto the CDN base; absolute URLs pass through
pub fn image_url(image_base: &str, path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        image_base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    pub base_url: String,
    pub image_base_url: String,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: String, image_base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .user_agent(concat!("binh-cinema/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url,
            image_base_url,
            client,
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.image_base_url.clone())
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "catalog request");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::from_reqwest(&url, REQUEST_TIMEOUT_SECS, e))?;

        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown").to_string();
            warn!(%url, status = status.as_u16(), "catalog returned error status");
            return Err(CatalogError::ServerError(status.as_u16(), reason));
        }

        resp.text()
            .await
            .map_err(|e| CatalogError::from_reqwest(&url, REQUEST_TIMEOUT_SECS, e))
    }

    pub async fn latest(&self, page: u32) -> Result<Page<Movie>, CatalogError> {
        let body = self
            .get_text("/danh-sach/phim-moi-cap-nhat", &[("page", page.to_string())])
            .await?;
        parse_page(&body)
    }

    pub async fn search(&self, keyword: &str, page: u32) -> Result<Page<Movie>, CatalogError> {
        let body = self
            .get_text(
                "/v1/api/tim-kiem",
                &[("keyword", keyword.to_string()), ("page", page.to_string())],
            )
            .await?;
        parse_page(&body)
    }

    pub async fn list_by_type(&self, type_slug: &str, page: u32) -> Result<Page<Movie>, CatalogError> {
        let path = format!("/v1/api/danh-sach/{}", urlencoding::encode(type_slug));
        let body = self.get_text(&path, &[("page", page.to_string())]).await?;
        parse_page(&body)
    }

    pub async fn list_by_category(&self, genre_slug: &str, page: u32) -> Result<Page<Movie>, CatalogError> {
        let path = format!("/v1/api/the-loai/{}", urlencoding::encode(genre_slug));
        let body = self.get_text(&path, &[("page", page.to_string())]).await?;
        parse_page(&body)
    }

    pub async fn fetch_listing(&self, listing: &Listing, page: u32) -> Result<Page<Movie>, CatalogError> {
        match listing {
            Listing::Latest => self.latest(page).await,
            Listing::Search(q) => self.search(q, page).await,
            Listing::Type(t) => self.list_by_type(t, page).await,
            Listing::Category(c) => self.list_by_category(c, page).await,
        }
    }

    pub async fn movie_detail(&self, slug: &str) -> Result<MovieDetail, CatalogError> {
        let path = format!("/phim/{}", urlencoding::encode(slug));
        let body = self.get_text(&path, &[]).await?;
        parse_detail(slug, &body)
    }

    pub fn image_url(&self, path: &str) -> String {
        image_url(&self.image_base_url, path)
    }
}
