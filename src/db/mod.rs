//! Database layer
//!
//! This module provides database abstraction for the Newsroom site.
//! It supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Usage
//!
//! ```ignore
//! use newsroom::config::DatabaseConfig;
//! use newsroom::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, mysql_pool, sqlite_pool, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
