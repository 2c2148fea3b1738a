//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Delete a user (their sessions and comments go with them)
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count total users
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(sqlite_pool(&self.pool)?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(mysql_pool(&self.pool)?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_username_sqlite(sqlite_pool(&self.pool)?, username).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_username_mysql(mysql_pool(&self.pool)?, username).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_user_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => delete_user_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_users_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => count_users_mysql(mysql_pool(&self.pool)?).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: user.username.clone(),
        password_hash: user.password_hash.clone(),
        created_at: now,
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password_hash, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    Ok(row.as_ref().map(row_to_user_sqlite))
}

async fn get_user_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password_hash, created_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    Ok(row.as_ref().map(row_to_user_sqlite))
}

async fn delete_user_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

async fn count_users_sqlite(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(count)
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        username: user.username.clone(),
        password_hash: user.password_hash.clone(),
        created_at: now,
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password_hash, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    Ok(row.as_ref().map(row_to_user_mysql))
}

async fn get_user_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password_hash, created_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    Ok(row.as_ref().map(row_to_user_mysql))
}

async fn delete_user_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(())
}

async fn count_users_mysql(pool: &MySqlPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(count)
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_user(username: &str) -> User {
        User::new(username, "$argon2id$v=19$m=19456,t=2,p=1$salt$hash")
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_user("Лев Толстой"))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "Лев Толстой");
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&create_test_user("reader")).await.unwrap();

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "reader");
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(999).await.expect("Failed to get user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_username() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("Читатель простой")).await.unwrap();

        let found = repo
            .get_by_username("Читатель простой")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.username, "Читатель простой");
        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&create_test_user("deleteme")).await.unwrap();

        repo.delete(created.id).await.expect("Failed to delete user");

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_users() {
        let (_pool, repo) = setup_test_repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);

        repo.create(&create_test_user("user1")).await.unwrap();
        repo.create(&create_test_user("user2")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unique_username_constraint() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&create_test_user("duplicate")).await.unwrap();
        let result = repo.create(&create_test_user("duplicate")).await;

        assert!(result.is_err(), "Should fail due to duplicate username");
    }

    #[tokio::test]
    async fn test_password_hash_stored_correctly() {
        let (_pool, repo) = setup_test_repo().await;
        let hash = hash_password("my_secure_password").expect("Failed to hash password");

        let created = repo.create(&User::new("hashtest", hash.clone())).await.unwrap();
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(found.password_hash, hash);
        assert!(found.password_hash.starts_with("$argon2id$"));
    }
}
