//! News service
//!
//! Read side of the site: the home listing and single news items. News
//! items are created here too (used by seeding and tests), but there is no
//! authoring UI.

use crate::db::repositories::NewsRepository;
use crate::models::{CreateNewsInput, News, NewsSummary, TITLE_MAX_LEN};
use anyhow::Context;
use std::sync::Arc;

/// Error types for news service operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    #[error("News item not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// News service
pub struct NewsService {
    repo: Arc<dyn NewsRepository>,
    items_per_page: u32,
}

impl NewsService {
    pub fn new(repo: Arc<dyn NewsRepository>, items_per_page: u32) -> Self {
        Self {
            repo,
            items_per_page,
        }
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    /// Items for the home page: newest first, at most `items_per_page`
    pub async fn list_home(&self) -> Result<Vec<NewsSummary>, NewsServiceError> {
        let items = self
            .repo
            .list_latest(i64::from(self.items_per_page))
            .await
            .context("Failed to list news")?;

        Ok(items)
    }

    pub async fn get(&self, id: i64) -> Result<News, NewsServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get news")?
            .ok_or(NewsServiceError::NotFound(id))
    }

    pub async fn create(&self, input: CreateNewsInput) -> Result<News, NewsServiceError> {
        if input.title.trim().is_empty() {
            return Err(NewsServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.title.chars().count() > TITLE_MAX_LEN {
            return Err(NewsServiceError::ValidationError(format!(
                "Title cannot be longer than {} characters",
                TITLE_MAX_LEN
            )));
        }

        let news = self
            .repo
            .create(&input)
            .await
            .context("Failed to create news")?;

        tracing::info!("News item {} created: {}", news.id, news.title);
        Ok(news)
    }

    pub async fn count(&self) -> Result<i64, NewsServiceError> {
        Ok(self.repo.count().await.context("Failed to count news")?)
    }
}
