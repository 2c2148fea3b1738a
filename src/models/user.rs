//! User model
//!
//! Users are identified by a unique username. The only per-user permission in
//! the site is comment ownership, so there are no roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new, not yet persisted user.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether this user wrote the comment with the given author id
    pub fn owns(&self, author_id: i64) -> bool {
        self.id == author_id
    }
}
