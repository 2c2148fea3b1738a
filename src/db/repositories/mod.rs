//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a specific entity.

pub mod comment;
pub mod news;
pub mod session;
pub mod user;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
