//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They are
//! responsible for:
//! - Implementing business rules (moderation, comment ownership)
//! - Handling validation and error cases
//! - Password hashing and session lifecycle

pub mod comment;
pub mod moderation;
pub mod news;
pub mod password;
pub mod user;

pub use comment::{CommentService, CommentServiceError};
pub use moderation::Moderator;
pub use news::{NewsService, NewsServiceError};
pub use password::{hash_password, verify_password};
pub use user::{UserService, UserServiceError};
