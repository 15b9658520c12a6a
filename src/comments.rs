use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::library::load_or_default;
use crate::storage::{Store, StoreError};

pub const COMMENTS_KEY: &str = "comments";
pub const MAX_COMMENT_CHARS: usize = 500;
const GUEST_NAME: &str = "Khách";

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment is empty")]
    Empty,
    #[error("comment is longer than {max} characters", max = MAX_COMMENT_CHARS)]
    TooLong,
    #[error("no comment with id {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub movie_slug: String,
    pub user_name: String,
    pub user_avatar: String,
    pub content: String,
    pub timestamp: i64,
    pub likes: u32,
    #[serde(default)]
    pub is_liked: bool,
}

/// Locally stored comments for all titles
pub struct CommentBoard {
    store: Option<Store>,
    comments: Vec<Comment>,
}

impl CommentBoard {
    pub fn load(store: Store) -> Self {
        let comments = load_or_default(&store, COMMENTS_KEY);
        Self {
            store: Some(store),
            comments,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            store: None,
            comments: Vec::new(),
        }
    }

    /// Comments on one title, newest first
    pub fn for_movie(&self, slug: &str) -> Vec<&Comment> {
        let mut out: Vec<&Comment> = self
            .comments
            .iter()
            .filter(|c| c.movie_slug == slug)
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    pub fn count_for(&self, slug: &str) -> usize {
        self.comments.iter().filter(|c| c.movie_slug == slug).count()
    }

    pub fn add(&mut self, slug: &str, user_name: &str, content: &str) -> Result<Comment, CommentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CommentError::Empty);
        }
        if content.chars().count() > MAX_COMMENT_CHARS {
            return Err(CommentError::TooLong);
        }
        let user_name = match user_name.trim() {
            "" => GUEST_NAME.to_string(),
            name => name.to_string(),
        };

        let now = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen();
        let comment = Comment {
            id: format!("{}-{:08x}", now, suffix),
            movie_slug: slug.to_string(),
            user_avatar: avatar_initial(&user_name),
            user_name,
            content: content.to_string(),
            timestamp: now,
            likes: 0,
            is_liked: false,
        };
        self.comments.push(comment.clone());
        self.persist()?;
        Ok(comment)
    }

    /// Flip the like; returns the new like state
    pub fn toggle_like(&mut self, id: &str) -> Result<bool, CommentError> {
        let comment = self
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CommentError::NotFound(id.to_string()))?;
        comment.is_liked = !comment.is_liked;
        if comment.is_liked {
            comment.likes += 1;
        } else {
            comment.likes = comment.likes.saturating_sub(1);
        }
        let liked = comment.is_liked;
        self.persist()?;
        Ok(liked)
    }

    fn persist(&self) -> Result<(), StoreError> {
        match &self.store {
            Some(store) => store.set(COMMENTS_KEY, &self.comments),
            None => Ok(()),
        }
    }
}

fn avatar_initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_validates_content() {
        let mut board = CommentBoard::in_memory();
        assert!(matches!(board.add("a", "An", "   "), Err(CommentError::Empty)));
        let long = "x".repeat(MAX_COMMENT_CHARS + 1);
        assert!(matches!(board.add("a", "An", &long), Err(CommentError::TooLong)));

        let c = board.add("a", "  ", "  hay quá ").unwrap();
        assert_eq!(c.user_name, "Khách");
        assert_eq!(c.user_avatar, "K");
        assert_eq!(c.content, "hay quá");
        assert_eq!(board.count_for("a"), 1);
        assert_eq!(board.count_for("b"), 0);
    }

    #[test]
    fn test_toggle_like_never_negative() {
        let mut board = CommentBoard::in_memory();
        let c = board.add("a", "An", "ok").unwrap();
        assert!(board.toggle_like(&c.id).unwrap());
        assert_eq!(board.for_movie("a")[0].likes, 1);
        assert!(!board.toggle_like(&c.id).unwrap());
        assert_eq!(board.for_movie("a")[0].likes, 0);
        assert!(matches!(board.toggle_like("nope"), Err(CommentError::NotFound(_))));
    }

    #[test]
    fn test_comments_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let mut board = CommentBoard::load(store.clone());
        board.add("a", "An", "first").unwrap();
        let board = CommentBoard::load(store);
        assert_eq!(board.for_movie("a").len(), 1);
    }
}
