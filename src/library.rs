//! Watch history and favorites, persisted through the key-value store.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::Movie;
use crate::storage::{Store, StoreError};

pub const HISTORY_KEY: &str = "watch_history";
pub const FAVORITES_KEY: &str = "favorites";

/// Positions at or below this many seconds are not worth resuming
const RESUME_MIN_SECS: f64 = 5.0;
/// Past this fraction of the runtime an episode counts as finished
const FINISHED_RATIO: f64 = 0.95;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub slug: String,
    pub name: String,
    pub poster: String,
    pub episode_name: String,
    pub episode_slug: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Seconds watched
    pub progress: f64,
    /// Total seconds, 0 when unknown
    pub duration: f64,
}

impl HistoryItem {
    pub fn progress_ratio(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.progress / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.duration > 0.0 && self.progress_ratio() >= FINISHED_RATIO
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct WatchHistory {
    pub items: Vec<HistoryItem>,
}

impl WatchHistory {
    /// Put `item` at the front, replacing any entry for the same title
    pub fn record(&mut self, item: HistoryItem, limit: usize) {
        self.items.retain(|h| h.slug != item.slug);
        self.items.insert(0, item);
        self.items.truncate(limit.max(1));
    }

    pub fn update_progress(
        &mut self,
        slug: &str,
        episode_slug: &str,
        progress: f64,
        duration: f64,
        now_ms: i64,
    ) -> bool {
        let Some(pos) = self
            .items
            .iter()
            .position(|h| h.slug == slug && h.episode_slug == episode_slug)
        else {
            return false;
        };
        let mut item = self.items.remove(pos);
        item.progress = progress.max(0.0);
        if duration > 0.0 {
            item.duration = duration;
        }
        item.timestamp = now_ms;
        self.items.insert(0, item);
        true
    }

    pub fn get(&self, slug: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|h| h.slug == slug)
    }

    /// Where to resume this episode, or None to start from the beginning
    pub fn resume_position(&self, slug: &str, episode_slug: &str) -> Option<f64> {
        let item = self
            .items
            .iter()
            .find(|h| h.slug == slug && h.episode_slug == episode_slug)?;
        if item.progress <= RESUME_MIN_SECS || item.is_finished() {
            return None;
        }
        Some(item.progress)
    }

    pub fn remove(&mut self, slug: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|h| h.slug != slug);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Favorites {
    pub items: Vec<Movie>,
}

impl Favorites {
    pub fn contains(&self, slug: &str) -> bool {
        self.items.iter().any(|m| m.slug == slug)
    }

    /// Returns true if the movie is a favorite afterwards
    pub fn toggle(&mut self, movie: &Movie) -> bool {
        if self.remove(&movie.slug) {
            false
        } else {
            self.items.insert(0, movie.clone());
            true
        }
    }

    pub fn remove(&mut self, slug: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|m| m.slug != slug);
        self.items.len() != before
    }
}

/// History + favorites bound to a store; every mutation is written through
pub struct Library {
    store: Option<Store>,
    history_limit: usize,
    pub history: WatchHistory,
    pub favorites: Favorites,
}

impl Library {
    /// Load from `store`, falling back to empty lists on corrupt documents
    pub fn load(store: Store, history_limit: usize) -> Self {
        let history = load_or_default(&store, HISTORY_KEY);
        let favorites = load_or_default(&store, FAVORITES_KEY);
        Self {
            store: Some(store),
            history_limit,
            history,
            favorites,
        }
    }

    /// Library that lives only in memory
    pub fn in_memory(history_limit: usize) -> Self {
        Self {
            store: None,
            history_limit,
            history: WatchHistory::default(),
            favorites: Favorites::default(),
        }
    }

    pub fn record_watch(&mut self, item: HistoryItem) -> Result<(), StoreError> {
        self.history.record(item, self.history_limit);
        self.persist_history()
    }

    pub fn update_progress(
        &mut self,
        slug: &str,
        episode_slug: &str,
        progress: f64,
        duration: f64,
    ) -> Result<bool, StoreError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let changed = self
            .history
            .update_progress(slug, episode_slug, progress, duration, now_ms);
        if changed {
            self.persist_history()?;
        }
        Ok(changed)
    }

    pub fn remove_history(&mut self, slug: &str) -> Result<bool, StoreError> {
        let removed = self.history.remove(slug);
        if removed {
            self.persist_history()?;
        }
        Ok(removed)
    }

    pub fn clear_history(&mut self) -> Result<(), StoreError> {
        self.history.clear();
        self.persist_history()
    }

    pub fn toggle_favorite(&mut self, movie: &Movie) -> Result<bool, StoreError> {
        let now_favorite = self.favorites.toggle(movie);
        self.persist_favorites()?;
        Ok(now_favorite)
    }

    pub fn remove_favorite(&mut self, slug: &str) -> Result<bool, StoreError> {
        let removed = self.favorites.remove(slug);
        if removed {
            self.persist_favorites()?;
        }
        Ok(removed)
    }

    fn persist_history(&self) -> Result<(), StoreError> {
        match &self.store {
            Some(store) => store.set(HISTORY_KEY, &self.history),
            None => Ok(()),
        }
    }

    fn persist_favorites(&self) -> Result<(), StoreError> {
        match &self.store {
            Some(store) => store.set(FAVORITES_KEY, &self.favorites),
            None => Ok(()),
        }
    }
}

pub(crate) fn load_or_default<T>(store: &Store, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match store.get::<T>(key) {
        Ok(Some(v)) => v,
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable stored value");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(slug: &str, ep: &str, progress: f64, duration: f64) -> HistoryItem {
        HistoryItem {
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            poster: String::new(),
            episode_name: ep.to_uppercase(),
            episode_slug: ep.to_string(),
            timestamp: 0,
            progress,
            duration,
        }
    }

    #[test]
    fn test_record_keeps_one_entry_per_title() {
        let mut h = WatchHistory::default();
        h.record(item("a", "tap-01", 0.0, 0.0), 50);
        h.record(item("b", "tap-01", 0.0, 0.0), 50);
        h.record(item("a", "tap-02", 0.0, 0.0), 50);
        assert_eq!(h.items.len(), 2);
        assert_eq!(h.items[0].slug, "a");
        assert_eq!(h.items[0].episode_slug, "tap-02");
    }

    #[test]
    fn test_record_respects_limit() {
        let mut h = WatchHistory::default();
        for i in 0..10 {
            h.record(item(&format!("m{}", i), "full", 0.0, 0.0), 3);
        }
        assert_eq!(h.items.len(), 3);
        assert_eq!(h.items[0].slug, "m9");
    }

    #[test]
    fn test_update_progress_only_matching_episode() {
        let mut h = WatchHistory::default();
        h.record(item("a", "tap-01", 0.0, 0.0), 50);
        h.record(item("b", "tap-01", 0.0, 0.0), 50);

        assert!(!h.update_progress("a", "tap-09", 10.0, 100.0, 1));
        assert!(h.update_progress("a", "tap-01", 42.0, 1200.0, 7));
        assert_eq!(h.items[0].slug, "a");
        assert_eq!(h.items[0].progress, 42.0);
        assert_eq!(h.items[0].duration, 1200.0);
        assert_eq!(h.items[0].timestamp, 7);

        // Unknown duration keeps the previous one
        h.update_progress("a", "tap-01", 50.0, 0.0, 8);
        assert_eq!(h.items[0].duration, 1200.0);
    }

    #[test]
    fn test_resume_position_thresholds() {
        let mut h = WatchHistory::default();
        h.record(item("start", "e", 3.0, 100.0), 50);
        h.record(item("mid", "e", 40.0, 100.0), 50);
        h.record(item("done", "e", 97.0, 100.0), 50);
        h.record(item("unknown", "e", 30.0, 0.0), 50);

        assert_eq!(h.resume_position("start", "e"), None);
        assert_eq!(h.resume_position("mid", "e"), Some(40.0));
        assert_eq!(h.resume_position("mid", "other"), None);
        assert_eq!(h.resume_position("done", "e"), None);
        assert_eq!(h.resume_position("unknown", "e"), Some(30.0));
    }

    #[test]
    fn test_favorites_toggle() {
        let mut f = Favorites::default();
        let m = Movie {
            slug: "a".into(),
            ..Default::default()
        };
        assert!(f.toggle(&m));
        assert!(f.contains("a"));
        assert!(!f.toggle(&m));
        assert!(!f.contains("a"));
    }

    #[test]
    fn test_library_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let mut lib = Library::load(store.clone(), 50);
        lib.record_watch(item("a", "tap-01", 0.0, 0.0)).unwrap();
        lib.update_progress("a", "tap-01", 90.0, 1800.0).unwrap();
        lib.toggle_favorite(&Movie {
            slug: "fav".into(),
            name: "Fav".into(),
            ..Default::default()
        })
        .unwrap();

        let reloaded = Library::load(store, 50);
        assert_eq!(reloaded.history.items.len(), 1);
        assert_eq!(reloaded.history.items[0].progress, 90.0);
        assert!(reloaded.favorites.contains("fav"));
    }

    #[test]
    fn test_library_survives_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("favorites.json"), "[[[").unwrap();
        let store = Store::open(dir.path()).unwrap();
        let lib = Library::load(store, 50);
        assert!(lib.favorites.items.is_empty());
    }
}
