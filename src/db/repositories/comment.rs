//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::{Comment, CommentWithAuthor, NewComment};

/// `created` as stored: MySQL `DATETIME(6)` keeps microseconds only
fn stored_timestamp(created: DateTime<Utc>) -> DateTime<Utc> {
    created.trunc_subsecs(6)
}

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment
    async fn create(&self, input: &NewComment) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments under a news item, oldest first, with author names
    async fn list_for_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Replace a comment's text. Returns false if no such comment.
    async fn update_text(&self, id: i64, text: &str) -> Result<bool>;

    /// Delete a comment. Returns false if no such comment.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count all comments
    async fn count(&self) -> Result<i64>;
}

/// Comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, input: &NewComment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(sqlite_pool(&self.pool)?, input).await,
            DatabaseDriver::Mysql => create_mysql(mysql_pool(&self.pool)?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn list_for_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_for_news_sqlite(sqlite_pool(&self.pool)?, news_id).await,
            DatabaseDriver::Mysql => list_for_news_mysql(mysql_pool(&self.pool)?, news_id).await,
        }
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_text_sqlite(sqlite_pool(&self.pool)?, id, text).await,
            DatabaseDriver::Mysql => update_text_mysql(mysql_pool(&self.pool)?, id, text).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => delete_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => count_mysql(mysql_pool(&self.pool)?).await,
        }
    }
}

const LIST_FOR_NEWS_SQL: &str = r#"
    SELECT c.id, c.news_id, c.author_id, c.text, c.created, u.username
    FROM comments c
    JOIN users u ON c.author_id = u.id
    WHERE c.news_id = ?
    ORDER BY c.created ASC, c.id ASC
"#;

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, input: &NewComment) -> Result<Comment> {
    let created = stored_timestamp(input.created);
    let result = sqlx::query(
        "INSERT INTO comments (news_id, author_id, text, created) VALUES (?, ?, ?, ?)",
    )
    .bind(input.news_id)
    .bind(input.author_id)
    .bind(&input.text)
    .bind(created)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        news_id: input.news_id,
        author_id: input.author_id,
        text: input.text.clone(),
        created,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query("SELECT id, news_id, author_id, text, created FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    Ok(row.as_ref().map(row_to_comment_sqlite))
}

async fn list_for_news_sqlite(pool: &SqlitePool, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_FOR_NEWS_SQL)
        .bind(news_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: row_to_comment_sqlite(row),
            author_username: row.get("username"),
        })
        .collect())
}

async fn update_text_sqlite(pool: &SqlitePool, id: i64, text: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
        .bind(text)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;

    Ok(result.rows_affected() > 0)
}

async fn count_sqlite(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    Ok(count)
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created: row.get("created"),
    }
}

// MySQL implementations
async fn create_mysql(pool: &MySqlPool, input: &NewComment) -> Result<Comment> {
    let created = stored_timestamp(input.created);
    let result = sqlx::query(
        "INSERT INTO comments (news_id, author_id, text, created) VALUES (?, ?, ?, ?)",
    )
    .bind(input.news_id)
    .bind(input.author_id)
    .bind(&input.text)
    .bind(created)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        news_id: input.news_id,
        author_id: input.author_id,
        text: input.text.clone(),
        created,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query("SELECT id, news_id, author_id, text, created FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    Ok(row.as_ref().map(row_to_comment_mysql))
}

async fn list_for_news_mysql(pool: &MySqlPool, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_FOR_NEWS_SQL)
        .bind(news_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: row_to_comment_mysql(row),
            author_username: row.get("username"),
        })
        .collect())
}

async fn update_text_mysql(pool: &MySqlPool, id: i64, text: &str) -> Result<bool> {
    // MySQL reports 0 affected rows when the text is unchanged, so check existence separately
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up comment")?;
    if exists.is_none() {
        return Ok(false);
    }

    sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
        .bind(text)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    Ok(true)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;

    Ok(result.rows_affected() > 0)
}

async fn count_mysql(pool: &MySqlPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    Ok(count)
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created: row.get("created"),
    }
}
