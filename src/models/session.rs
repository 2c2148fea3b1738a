//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session entity for user authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a fresh session for a user, valid for `ttl`
    pub fn start(user_id: i64, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_not_expired() {
        let session = Session::start(1, Duration::days(7));
        assert!(!session.is_expired());
        assert_eq!(session.user_id, 1);
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let session = Session::start(1, Duration::seconds(-1));
        assert!(session.is_expired());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = Session::start(1, Duration::days(1));
        let b = Session::start(1, Duration::days(1));
        assert_ne!(a.id, b.id);
    }
}
