use std::fmt;
use thiserror::Error;

use crate::api::Listing;

const BACK_STACK_LIMIT: usize = 50;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("no page at {0}")]
    Unknown(String),
    #[error("missing {0} in {1}")]
    MissingParam(&'static str, String),
}

/// Query string of the search/listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub kind: Option<String>,
    pub category: Option<String>,
    /// 1-based
    pub page: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            kind: None,
            category: None,
            page: 1,
        }
    }
}

impl SearchQuery {
    pub fn keyword(q: impl Into<String>) -> Self {
        Self {
            keyword: Some(q.into()),
            ..Default::default()
        }
    }

    pub fn kind(t: impl Into<String>) -> Self {
        Self {
            kind: Some(t.into()),
            ..Default::default()
        }
    }

    pub fn category(c: impl Into<String>) -> Self {
        Self {
            category: Some(c.into()),
            ..Default::default()
        }
    }

    /// Keyword wins over type, type over category; nothing means newest titles
    pub fn listing(&self) -> Listing {
        if let Some(q) = self.keyword.as_ref().filter(|q| !q.trim().is_empty()) {
            Listing::Search(q.trim().to_string())
        } else if let Some(t) = self.kind.as_ref().filter(|t| !t.is_empty()) {
            Listing::Type(t.clone())
        } else if let Some(c) = self.category.as_ref().filter(|c| !c.is_empty()) {
            Listing::Category(c.clone())
        } else {
            Listing::Latest
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Details { slug: String },
    Watch { slug: String, episode_slug: String },
    Search(SearchQuery),
    Library,
}

impl Default for Route {
    fn default() -> Self {
        Route::Home
    }
}

impl Route {
    pub fn details(slug: impl Into<String>) -> Self {
        Route::Details { slug: slug.into() }
    }

    pub fn watch(slug: impl Into<String>, episode_slug: impl Into<String>) -> Self {
        Route::Watch {
            slug: slug.into(),
            episode_slug: episode_slug.into(),
        }
    }

    /// Parse a hash-router path such as `#/xem-phim/ten-phim/tap-01`
    pub fn parse(path: &str) -> Result<Route, RouteError> {
        let raw = path.trim();
        let raw = raw.strip_prefix('#').unwrap_or(raw);
        let (path_part, query_part) = match raw.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (raw, None),
        };

        let segments: Vec<String> = path_part
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode)
            .collect();
        let segs: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segs.as_slice() {
            [] => Ok(Route::Home),
            ["phim", slug] => Ok(Route::details(*slug)),
            ["phim"] => Err(RouteError::MissingParam("slug", path.to_string())),
            ["xem-phim", slug, episode] => Ok(Route::watch(*slug, *episode)),
            ["xem-phim", ..] => Err(RouteError::MissingParam("episode", path.to_string())),
            ["tim-kiem"] => Ok(Route::Search(parse_query(query_part.unwrap_or("")))),
            ["thu-vien"] => Ok(Route::Library),
            _ => Err(RouteError::Unknown(path.to_string())),
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Details { slug } => format!("/phim/{}", urlencoding::encode(slug)),
            Route::Watch { slug, episode_slug } => format!(
                "/xem-phim/{}/{}",
                urlencoding::encode(slug),
                urlencoding::encode(episode_slug)
            ),
            Route::Search(q) => {
                let mut params = Vec::new();
                if let Some(k) = &q.keyword {
                    params.push(format!("q={}", urlencoding::encode(k)));
                }
                if let Some(t) = &q.kind {
                    params.push(format!("type={}", urlencoding::encode(t)));
                }
                if let Some(c) = &q.category {
                    params.push(format!("category={}", urlencoding::encode(c)));
                }
                if q.page > 1 {
                    params.push(format!("page={}", q.page));
                }
                if params.is_empty() {
                    "/tim-kiem".to_string()
                } else {
                    format!("/tim-kiem?{}", params.join("&"))
                }
            }
            Route::Library => "/thu-vien".to_string(),
        }
    }

    /// Slug of the title this route is about, if any
    pub fn slug(&self) -> Option<&str> {
        match self {
            Route::Details { slug } | Route::Watch { slug, .. } => Some(slug),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

fn decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|c| c.into_owned())
        .unwrap_or(spaced)
}

fn parse_query(query: &str) -> SearchQuery {
    let mut out = SearchQuery::default();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        let v = decode(v);
        match k {
            "q" => out.keyword = Some(v),
            "type" => out.kind = Some(v),
            "category" => out.category = Some(v),
            "page" => out.page = v.parse::<u32>().unwrap_or(1).max(1),
            _ => {}
        }
    }
    out
}

/// Route history with back/forward stacks
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Route,
    back: Vec<Route>,
    forward: Vec<Route>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            back: Vec::new(),
            forward: Vec::new(),
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    /// Returns false when already on `route`
    pub fn push(&mut self, route: Route) -> bool {
        if route == self.current {
            return false;
        }
        let previous = std::mem::replace(&mut self.current, route);
        self.back.push(previous);
        if self.back.len() > BACK_STACK_LIMIT {
            self.back.remove(0);
        }
        self.forward.clear();
        true
    }

    /// Swap the current route without touching history (pagination)
    pub fn replace(&mut self, route: Route) {
        self.current = route;
    }

    pub fn back(&mut self) -> bool {
        match self.back.pop() {
            Some(route) => {
                let previous = std::mem::replace(&mut self.current, route);
                self.forward.push(previous);
                true
            }
            None => false,
        }
    }

    pub fn forward(&mut self) -> bool {
        match self.forward.pop() {
            Some(route) => {
                let previous = std::mem::replace(&mut self.current, route);
                self.back.push(previous);
                true
            }
            None => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.back.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_routes() {
        assert_eq!(Route::parse("/").unwrap(), Route::Home);
        assert_eq!(Route::parse("#/").unwrap(), Route::Home);
        assert_eq!(Route::parse("/phim/ten-phim").unwrap(), Route::details("ten-phim"));
        assert_eq!(
            Route::parse("#/xem-phim/ten-phim/tap-01").unwrap(),
            Route::watch("ten-phim", "tap-01")
        );
        assert_eq!(Route::parse("/thu-vien").unwrap(), Route::Library);
    }

    #[test]
    fn test_parse_search_query() {
        let route = Route::parse("/tim-kiem?q=t%C3%ACnh%20y%C3%AAu&page=3").unwrap();
        let Route::Search(q) = route else { panic!("expected search route") };
        assert_eq!(q.keyword.as_deref(), Some("tình yêu"));
        assert_eq!(q.page, 3);
        assert_eq!(q.listing(), Listing::Search("tình yêu".into()));

        let Route::Search(q) = Route::parse("/tim-kiem?type=phim-bo&category=hanh-dong&page=abc").unwrap() else {
            panic!("expected search route")
        };
        assert_eq!(q.page, 1);
        assert_eq!(q.listing(), Listing::Type("phim-bo".into()));
    }

    #[test]
    fn test_empty_search_lists_latest() {
        let Route::Search(q) = Route::parse("/tim-kiem").unwrap() else { panic!() };
        assert_eq!(q.listing(), Listing::Latest);
        assert_eq!(SearchQuery::keyword("   ").listing(), Listing::Latest);
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        assert!(matches!(Route::parse("/phim"), Err(RouteError::MissingParam("slug", _))));
        assert!(matches!(Route::parse("/xem-phim/a"), Err(RouteError::MissingParam("episode", _))));
        assert!(matches!(Route::parse("/khong-co"), Err(RouteError::Unknown(_))));
    }

    #[test]
    fn test_default_query_round_trips() {
        let route = Route::Search(SearchQuery::default());
        assert_eq!(route.to_path(), "/tim-kiem");
        assert_eq!(Route::parse(&route.to_path()).unwrap(), route);
    }

    #[test]
    fn test_to_path_round_trips_encoded_keyword() {
        let route = Route::Search(SearchQuery::keyword("a&b c"));
        let path = route.to_path();
        assert_eq!(path, "/tim-kiem?q=a%26b%20c");
        assert_eq!(Route::parse(&path).unwrap(), route);
        assert_eq!(
            Route::Search(SearchQuery::category("kinh-di").with_page(2)).to_path(),
            "/tim-kiem?category=kinh-di&page=2"
        );
    }

    #[test]
    fn test_navigator_back_forward() {
        let mut nav = Navigator::new(Route::Home);
        assert!(nav.push(Route::details("a")));
        assert!(!nav.push(Route::details("a")));
        nav.push(Route::watch("a", "tap-01"));

        assert!(nav.back());
        assert_eq!(nav.current(), &Route::details("a"));
        assert!(nav.forward());
        assert_eq!(nav.current(), &Route::watch("a", "tap-01"));

        nav.back();
        nav.push(Route::Library);
        assert!(!nav.forward());
    }

    #[test]
    fn test_navigator_caps_back_stack() {
        let mut nav = Navigator::new(Route::Home);
        for i in 0..80 {
            nav.push(Route::details(format!("m{}", i)));
        }
        assert_eq!(nav.depth(), 50);
    }
}
