//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub news_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Comment with its author's name, for display under a news item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: String,
}

/// A comment ready to be inserted
#[derive(Debug, Clone)]
pub struct NewComment {
    pub news_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl NewComment {
    /// New comment stamped with the current time
    pub fn now(news_id: i64, author_id: i64, text: impl Into<String>) -> Self {
        Self {
            news_id,
            author_id,
            text: text.into(),
            created: Utc::now(),
        }
    }

    /// Override the creation timestamp
    pub fn created_at(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }
}
