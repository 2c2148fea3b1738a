//! News model

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum title length, enforced by the `news.title` column
pub const TITLE_MAX_LEN: usize = 50;

/// A published news item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Publication date
    pub date: NaiveDate,
}

/// News item as shown on the home page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSummary {
    #[serde(flatten)]
    pub news: News,
    pub comment_count: i64,
}

/// Input for creating a news item
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNewsInput {
    pub title: String,
    pub text: String,
    /// Defaults to today when absent
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl CreateNewsInput {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            date: None,
        }
    }

    /// Set an explicit publication date
    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Publication date, falling back to today
    pub fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}
