use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::api::Movie;

/// Queries need more than this many characters before they hit the catalog
pub const MIN_QUERY_CHARS: usize = 2;
const RECENT_CAPACITY: usize = 20;
const SUGGESTION_LIMIT: usize = 5;

/// A debounced query that is due to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: String,
}

/// Instant search box state: debounce timer, dropdown results, recent queries
#[derive(Debug, Clone)]
pub struct InstantSearch {
    query: String,
    debounce: Duration,
    limit: usize,
    /// Bumped on every edit; responses from older generations are stale
    generation: u64,
    pending_since: Option<Instant>,
    pub results: Vec<Movie>,
    pub open: bool,
    pub selected: Option<usize>,
    pub recent: VecDeque<String>,
}

impl Default for InstantSearch {
    fn default() -> Self {
        Self::new(Duration::from_millis(300), 5)
    }
}

impl InstantSearch {
    pub fn new(debounce: Duration, limit: usize) -> Self {
        Self {
            query: String::new(),
            debounce,
            limit: limit.max(1),
            generation: 0,
            pending_since: None,
            results: Vec::new(),
            open: false,
            selected: None,
            recent: VecDeque::with_capacity(RECENT_CAPACITY),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Dropdown is shown only when open and there is something to show
    pub fn is_visible(&self) -> bool {
        self.open && !self.results.is_empty()
    }

    /// Record an edit. Any pending timer is replaced; short queries close the dropdown.
    pub fn set_query(&mut self, query: &str, now: Instant) {
        if query == self.query {
            return;
        }
        self.query = query.to_string();
        self.generation += 1;

        if self.query.chars().count() > MIN_QUERY_CHARS {
            self.pending_since = Some(now);
        } else {
            self.pending_since = None;
            self.results.clear();
            self.open = false;
            self.selected = None;
        }
    }

    /// When the pending timer fires, if one is armed
    pub fn deadline(&self) -> Option<Instant> {
        self.pending_since.map(|t| t + self.debounce)
    }

    /// Fire the debounce timer if it is due
    pub fn poll(&mut self, now: Instant) -> Option<SearchTicket> {
        let due = self.deadline()?;
        if now < due {
            return None;
        }
        self.pending_since = None;
        debug!(query = %self.query, generation = self.generation, "instant search fired");
        Some(SearchTicket {
            generation: self.generation,
            query: self.query.clone(),
        })
    }

    /// Apply a response; returns false if it was stale and dropped
    pub fn apply_results(&mut self, generation: u64, mut items: Vec<Movie>) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale instant results");
            return false;
        }
        items.truncate(self.limit);
        self.results = items;
        self.open = true;
        self.selected = None;
        true
    }

    /// Failed lookups leave whatever was shown before
    pub fn apply_failure(&mut self, generation: u64, error: &str) {
        if generation == self.generation {
            warn!(query = %self.query, %error, "instant search failed");
        } else {
            debug!(generation, current = self.generation, %error, "stale instant search failed");
        }
    }

    /// Close the dropdown without touching the query
    pub fn dismiss(&mut self) {
        self.open = false;
        self.selected = None;
    }

    /// Submit the box. Returns the trimmed query to navigate to, or None if blank.
    pub fn submit(&mut self) -> Option<String> {
        let trimmed = self.query.trim().to_string();
        if trimmed.is_empty() {
            return None;
        }
        self.add_recent(trimmed.clone());
        self.clear();
        Some(trimmed)
    }

    /// Drop the query, timer and results
    pub fn clear(&mut self) {
        self.query.clear();
        self.generation += 1;
        self.pending_since = None;
        self.results.clear();
        self.open = false;
        self.selected = None;
    }

    /// Pick the highlighted dropdown entry, closing the dropdown
    pub fn choose_selected(&mut self) -> Option<Movie> {
        if !self.is_visible() {
            return None;
        }
        let movie = self.selected.and_then(|i| self.results.get(i)).cloned()?;
        self.open = false;
        self.selected = None;
        Some(movie)
    }

    pub fn select_next(&mut self) {
        if !self.is_visible() {
            return;
        }
        let len = self.results.len();
        self.selected = Some(match self.selected {
            None => 0,
            Some(i) => (i + 1) % len,
        });
    }

    pub fn select_previous(&mut self) {
        if !self.is_visible() {
            return;
        }
        let len = self.results.len();
        self.selected = Some(match self.selected {
            None | Some(0) => len - 1,
            Some(i) => i - 1,
        });
    }

    pub fn add_recent(&mut self, query: String) {
        if query.is_empty() {
            return;
        }
        if let Some(pos) = self.recent.iter().position(|q| q.eq_ignore_ascii_case(&query)) {
            self.recent.remove(pos);
        }
        if self.recent.len() >= RECENT_CAPACITY {
            self.recent.pop_back();
        }
        self.recent.push_front(query);
    }

    /// Recent queries containing `partial`, most recent first
    pub fn suggestions(&self, partial: &str) -> Vec<String> {
        let needle = partial.to_lowercase();
        self.recent
            .iter()
            .filter(|q| q.to_lowercase().contains(&needle))
            .take(SUGGESTION_LIMIT)
            .cloned()
            .collect()
    }
}
