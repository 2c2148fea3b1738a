//! User service
//!
//! Implements business logic for user management:
//! - Signup with username uniqueness and password confirmation
//! - Login/logout
//! - Session management

use crate::config::MAX_SESSION_EXPIRATION_DAYS;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{FormErrors, LoginFormData, Session, SignupFormData, User, REQUIRED_FIELD};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Longest accepted username, matching the `users.username` column
pub const USERNAME_MAX_LEN: usize = 150;

pub const INVALID_LOGIN: &str = "Пожалуйста, введите правильные имя пользователя и пароль. \
                                 Оба поля могут быть чувствительны к регистру.";
pub const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";
pub const PASSWORD_MISMATCH: &str = "Введённые пароли не совпадают.";
pub const USERNAME_TOO_LONG: &str = "Имя пользователя не может быть длиннее 150 символов.";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed")]
    AuthenticationError,

    /// Submitted form has field errors
    #[error("Validation failed")]
    ValidationError(FormErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with custom session expiration.
    ///
    /// The lifetime is clamped to `1..=MAX_SESSION_EXPIRATION_DAYS`.
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: session_expiration_days.clamp(1, MAX_SESSION_EXPIRATION_DAYS),
        }
    }

    /// How long a new session stays valid
    pub fn session_ttl(&self) -> Duration {
        Duration::days(self.session_expiration_days)
    }

    /// Register a new user.
    ///
    /// All problems with the submitted form are collected into a single
    /// `ValidationError` so the signup page can show them together.
    pub async fn signup(&self, input: &SignupFormData) -> Result<User, UserServiceError> {
        let username = input.username.trim();
        let mut errors = FormErrors::default();

        if username.is_empty() {
            errors.add("username", REQUIRED_FIELD);
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add("username", USERNAME_TOO_LONG);
        }
        if input.password1.is_empty() {
            errors.add("password1", REQUIRED_FIELD);
        }
        if input.password2.is_empty() {
            errors.add("password2", REQUIRED_FIELD);
        } else if !input.password1.is_empty() && input.password1 != input.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
        }

        if errors.field("username").is_empty()
            && self
                .user_repo
                .get_by_username(username)
                .await
                .context("Failed to check username")?
                .is_some()
        {
            errors.add("username", USERNAME_TAKEN);
        }

        if !errors.is_empty() {
            return Err(UserServiceError::ValidationError(errors));
        }

        let password_hash = hash_password(&input.password1).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create(&User::new(username, password_hash))
            .await
            .context("Failed to create user")?;

        tracing::info!("User registered: {}", user.username);
        Ok(user)
    }

    /// Check credentials and open a session
    pub async fn login(&self, input: &LoginFormData) -> Result<(User, Session), UserServiceError> {
        let mut errors = FormErrors::default();
        if input.username.trim().is_empty() {
            errors.add("username", REQUIRED_FIELD);
        }
        if input.password.is_empty() {
            errors.add("password", REQUIRED_FIELD);
        }
        if !errors.is_empty() {
            return Err(UserServiceError::ValidationError(errors));
        }

        let user = self
            .user_repo
            .get_by_username(input.username.trim())
            .await
            .context("Failed to get user by username")?
            .ok_or(UserServiceError::AuthenticationError)?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::info!("Failed login for {}", user.username);
            return Err(UserServiceError::AuthenticationError);
        }

        let session = self.start_session(user.id).await?;
        tracing::info!("User logged in: {}", user.username);
        Ok((user, session))
    }

    /// Open a new session for a user without checking credentials
    pub async fn start_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::start(user_id, self.session_ttl());

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        tracing::debug!("Session closed");
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Unknown and expired tokens yield `None`; expired sessions are removed.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?;

        Ok(user)
    }

    /// Remove all expired sessions, returning how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        )
    }

    #[tokio::test]
    async fn test_session_expiration_is_clamped() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let users = SqlxUserRepository::boxed(pool.clone());
        let user = users.create(&User::new("Лев Толстой", "hash")).await.unwrap();
        let service = UserService::with_session_expiration(
            users,
            SqlxSessionRepository::boxed(pool),
            1_000_000_000_000_000,
        );

        assert_eq!(service.session_ttl(), Duration::days(MAX_SESSION_EXPIRATION_DAYS));
        let session = service.start_session(user.id).await.unwrap();
        assert!(!session.is_expired());
        assert_eq!(
            service.validate_session(&session.id).await.unwrap().map(|u| u.id),
            Some(user.id)
        );
    }

    fn signup_data(username: &str, password1: &str, password2: &str) -> SignupFormData {
        SignupFormData {
            username: username.to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
        }
    }

    fn login_data(username: &str, password: &str) -> LoginFormData {
        LoginFormData {
            username: username.to_string(),
            password: password.to_string(),
            next: None,
        }
    }

    fn validation_errors(result: Result<User, UserServiceError>) -> FormErrors {
        match result {
            Err(UserServiceError::ValidationError(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signup_and_login() {
        let service = setup_service().await;

        let user = service
            .signup(&signup_data("Лев Толстой", "secret-pass", "secret-pass"))
            .await
            .expect("Failed to sign up");
        assert_ne!(user.password_hash, "secret-pass");

        let (logged_in, session) = service
            .login(&login_data("Лев Толстой", "secret-pass"))
            .await
            .expect("Failed to log in");

        assert_eq!(logged_in.id, user.id);
        assert_eq!(session.user_id, user.id);
    }

    #[tokio::test]
    async fn test_signup_requires_fields() {
        let service = setup_service().await;

        let errors = validation_errors(service.signup(&signup_data(" ", "", "")).await);

        assert_eq!(errors.field("username"), [REQUIRED_FIELD]);
        assert_eq!(errors.field("password1"), [REQUIRED_FIELD]);
        assert_eq!(errors.field("password2"), [REQUIRED_FIELD]);
    }

    #[tokio::test]
    async fn test_signup_password_mismatch() {
        let service = setup_service().await;

        let errors = validation_errors(service.signup(&signup_data("reader", "one", "two")).await);

        assert_eq!(errors.field("password2"), [PASSWORD_MISMATCH]);
        assert!(service.get_by_username("reader").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let service = setup_service().await;
        service
            .signup(&signup_data("reader", "pass", "pass"))
            .await
            .unwrap();

        let errors = validation_errors(service.signup(&signup_data("reader", "pass", "pass")).await);

        assert_eq!(errors.field("username"), [USERNAME_TAKEN]);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup_service().await;
        service
            .signup(&signup_data("reader", "right", "right"))
            .await
            .unwrap();

        let wrong = service.login(&login_data("reader", "wrong")).await;
        let unknown = service.login(&login_data("nobody", "right")).await;

        assert!(matches!(wrong, Err(UserServiceError::AuthenticationError)));
        assert!(matches!(unknown, Err(UserServiceError::AuthenticationError)));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let service = setup_service().await;

        match service.login(&login_data("", "")).await {
            Err(UserServiceError::ValidationError(errors)) => {
                assert_eq!(errors.field("username"), [REQUIRED_FIELD]);
                assert_eq!(errors.field("password"), [REQUIRED_FIELD]);
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_validate_and_logout_session() {
        let service = setup_service().await;
        let user = service
            .signup(&signup_data("reader", "pass", "pass"))
            .await
            .unwrap();
        let session = service.start_session(user.id).await.unwrap();

        let current = service.validate_session(&session.id).await.unwrap();
        assert_eq!(current.map(|u| u.id), Some(user.id));

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
            -1,
        );
        let user = service
            .signup(&signup_data("reader", "pass", "pass"))
            .await
            .unwrap();
        let session = service.start_session(user.id).await.unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token_is_anonymous() {
        let service = setup_service().await;
        assert!(service.validate_session("no-such-token").await.unwrap().is_none());
    }
}
