//! News repository
//!
//! Database operations for news items. The home listing is served by
//! `list_latest`, which also counts each item's comments.

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::{CreateNewsInput, News, NewsSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Create a news item
    async fn create(&self, input: &CreateNewsInput) -> Result<News>;

    /// Get a news item by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    /// Newest items first (by date, then by id), at most `limit`
    async fn list_latest(&self, limit: i64) -> Result<Vec<NewsSummary>>;

    /// Delete a news item together with its comments
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count news items
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based news repository implementation
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, input: &CreateNewsInput) -> Result<News> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_news_sqlite(sqlite_pool(&self.pool)?, input).await,
            DatabaseDriver::Mysql => create_news_mysql(mysql_pool(&self.pool)?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_news_by_id_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_news_by_id_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn list_latest(&self, limit: i64) -> Result<Vec<NewsSummary>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_latest_sqlite(sqlite_pool(&self.pool)?, limit).await,
            DatabaseDriver::Mysql => list_latest_mysql(mysql_pool(&self.pool)?, limit).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_news_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => delete_news_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_news_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => count_news_mysql(mysql_pool(&self.pool)?).await,
        }
    }
}

const LIST_LATEST_SQL: &str = r#"
    SELECT n.id, n.title, n.text, n.date,
           (SELECT COUNT(*) FROM comments c WHERE c.news_id = n.id) AS comment_count
    FROM news n
    ORDER BY n.date DESC, n.id DESC
    LIMIT ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_news_sqlite(pool: &SqlitePool, input: &CreateNewsInput) -> Result<News> {
    let date = input.date_or_today();

    let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
        .bind(&input.title)
        .bind(&input.text)
        .bind(date)
        .execute(pool)
        .await
        .context("Failed to create news")?;

    Ok(News {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        text: input.text.clone(),
        date,
    })
}

async fn get_news_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    Ok(row.as_ref().map(row_to_news_sqlite))
}

async fn list_latest_sqlite(pool: &SqlitePool, limit: i64) -> Result<Vec<NewsSummary>> {
    let rows = sqlx::query(LIST_LATEST_SQL)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list news")?;

    Ok(rows
        .iter()
        .map(|row| NewsSummary {
            news: row_to_news_sqlite(row),
            comment_count: row.get("comment_count"),
        })
        .collect())
}

async fn delete_news_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM news WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete news")?;

    Ok(())
}

async fn count_news_sqlite(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
        .fetch_one(pool)
        .await
        .context("Failed to count news")?;

    Ok(count)
}

fn row_to_news_sqlite(row: &sqlx::sqlite::SqliteRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        date: row.get("date"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_news_mysql(pool: &MySqlPool, input: &CreateNewsInput) -> Result<News> {
    let date = input.date_or_today();

    let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
        .bind(&input.title)
        .bind(&input.text)
        .bind(date)
        .execute(pool)
        .await
        .context("Failed to create news")?;

    Ok(News {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        text: input.text.clone(),
        date,
    })
}

async fn get_news_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    Ok(row.as_ref().map(row_to_news_mysql))
}

async fn list_latest_mysql(pool: &MySqlPool, limit: i64) -> Result<Vec<NewsSummary>> {
    let rows = sqlx::query(LIST_LATEST_SQL)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list news")?;

    Ok(rows
        .iter()
        .map(|row| NewsSummary {
            news: row_to_news_mysql(row),
            comment_count: row.get("comment_count"),
        })
        .collect())
}

async fn delete_news_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM news WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete news")?;

    Ok(())
}

async fn count_news_mysql(pool: &MySqlPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
        .fetch_one(pool)
        .await
        .context("Failed to count news")?;

    Ok(count)
}

fn row_to_news_mysql(row: &sqlx::mysql::MySqlRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        date: row.get("date"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::{Duration, NaiveDate, Utc};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxNewsRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxNewsRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_create_and_get_news() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&CreateNewsInput::new("Заголовок", "Текст"))
            .await
            .expect("Failed to create news");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get news")
            .expect("News not found");

        assert_eq!(found, created);
        assert_eq!(found.date, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn test_get_news_not_found() {
        let (_pool, repo) = setup_test_repo().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_latest_orders_by_date_desc() {
        let (_pool, repo) = setup_test_repo().await;
        let today = Utc::now().date_naive();

        // Insert oldest first so insertion order does not match the expected order
        for days_ago in (0..5).rev() {
            let input = CreateNewsInput::new(format!("Новость {days_ago}"), "Просто текст.")
                .dated(today - Duration::days(days_ago));
            repo.create(&input).await.unwrap();
        }

        let items = repo.list_latest(10).await.expect("Failed to list news");
        let dates: Vec<NaiveDate> = items.iter().map(|s| s.news.date).collect();

        assert_eq!(items.len(), 5);
        assert_eq!(dates[0], today);
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_list_latest_respects_limit() {
        let (_pool, repo) = setup_test_repo().await;

        for i in 0..11 {
            repo.create(&CreateNewsInput::new(format!("Новость {i}"), "Текст"))
                .await
                .unwrap();
        }

        assert_eq!(repo.list_latest(10).await.unwrap().len(), 10);
        assert_eq!(repo.count().await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_same_date_newest_id_first() {
        let (_pool, repo) = setup_test_repo().await;
        let first = repo.create(&CreateNewsInput::new("a", "x")).await.unwrap();
        let second = repo.create(&CreateNewsInput::new("b", "x")).await.unwrap();

        let items = repo.list_latest(10).await.unwrap();

        assert_eq!(items[0].news.id, second.id);
        assert_eq!(items[1].news.id, first.id);
    }

    #[tokio::test]
    async fn test_list_latest_counts_comments() {
        let (pool, repo) = setup_test_repo().await;
        let news = repo.create(&CreateNewsInput::new("t", "x")).await.unwrap();
        let sqlite = sqlite_pool(&pool).unwrap();

        sqlx::query("INSERT INTO users (username, password_hash) VALUES ('u', 'h')")
            .execute(sqlite)
            .await
            .unwrap();
        for _ in 0..3 {
            sqlx::query(
                "INSERT INTO comments (news_id, author_id, text, created) VALUES (?, 1, 'c', CURRENT_TIMESTAMP)",
            )
            .bind(news.id)
            .execute(sqlite)
            .await
            .unwrap();
        }

        let items = repo.list_latest(10).await.unwrap();
        assert_eq!(items[0].comment_count, 3);
    }

    #[tokio::test]
    async fn test_delete_news() {
        let (_pool, repo) = setup_test_repo().await;
        let news = repo.create(&CreateNewsInput::new("t", "x")).await.unwrap();

        repo.delete(news.id).await.unwrap();

        assert!(repo.get_by_id(news.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
