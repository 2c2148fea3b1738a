//! HTTP middleware and shared handler plumbing
//!
//! Contains:
//! - `AppState`, the shared services handed to every handler
//! - Session token extraction and the optional-auth middleware
//! - `PageError` and the middleware that renders it as an HTML error page
//! - Redirect helpers (`found`, `login_redirect`)

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tera::Context as TeraContext;

use crate::config::Config;
use crate::db::repositories::{
    SqlxCommentRepository, SqlxNewsRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    CommentService, CommentServiceError, Moderator, NewsService, NewsServiceError, UserService,
    UserServiceError,
};
use crate::theme::{StandardTemplateVars, ThemeEngine};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Where anonymous users are sent to authenticate
pub const LOGIN_URL: &str = "/auth/login/";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub news_service: Arc<NewsService>,
    pub comment_service: Arc<CommentService>,
    pub user_service: Arc<UserService>,
    pub theme_engine: Arc<ThemeEngine>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let theme_engine = ThemeEngine::new(config.theme.path.as_deref())?;

        let news_service = NewsService::new(
            SqlxNewsRepository::boxed(pool.clone()),
            config.news.items_per_page,
        );
        let comment_service = CommentService::new(
            SqlxCommentRepository::boxed(pool.clone()),
            Moderator::from_config(&config.news),
        );
        let user_service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            config.session.expiration_days,
        );

        Ok(Self {
            pool,
            news_service: Arc::new(news_service),
            comment_service: Arc::new(comment_service),
            user_service: Arc::new(user_service),
            theme_engine: Arc::new(theme_engine),
        })
    }

    /// Render a page template for the given user and request path
    pub fn render<T: Serialize>(
        &self,
        template: &str,
        page: &T,
        user: Option<&User>,
        request_path: &str,
    ) -> Result<Html<String>, PageError> {
        let vars = StandardTemplateVars::new(request_path).with_user(user);
        let html = self.theme_engine.render_page(template, page, &vars)?;
        Ok(Html(html))
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Authenticated user attached to the request by `optional_auth`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// The current user, if the request carries a valid session
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|AuthenticatedUser(user)| user.clone()),
        ))
    }
}

/// Extract session token from the `Authorization: Bearer` header or the
/// `session` cookie, in that order
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Optional authentication middleware
///
/// Resolves the session token (if any) and attaches the user to the request.
/// Invalid or expired tokens leave the request anonymous.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers()) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// `Set-Cookie` value opening a session
pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    )
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie() -> String {
    session_cookie("", 0)
}

// ============================================================================
// Redirects
// ============================================================================

/// `302 Found` to `location`
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// URL of the login page that returns to `next` afterwards
pub fn login_url(next: &str) -> String {
    // Slashes stay readable in the query string
    let next = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", LOGIN_URL, next)
}

/// Send an anonymous user to the login page
pub fn login_redirect(next: &str) -> Response {
    found(&login_url(next))
}

/// Whether `next` is a same-site path that is safe to redirect to
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.starts_with("/\\")
        && next.chars().all(|c| c.is_ascii_graphic())
}

// ============================================================================
// Error pages
// ============================================================================

/// Errors surfaced to the browser as HTML pages
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Marker left on error responses so `render_error_pages` can fill in the body
#[derive(Debug, Clone, Copy)]
struct ErrorPage(StatusCode);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = match self {
            PageError::NotFound => StatusCode::NOT_FOUND,
            PageError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorPage(status));
        response
    }
}

impl From<NewsServiceError> for PageError {
    fn from(e: NewsServiceError) -> Self {
        match e {
            NewsServiceError::NotFound(_) => PageError::NotFound,
            other => PageError::Internal(other.into()),
        }
    }
}

impl From<CommentServiceError> for PageError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NotFound => PageError::NotFound,
            other => PageError::Internal(other.into()),
        }
    }
}

impl From<UserServiceError> for PageError {
    fn from(e: UserServiceError) -> Self {
        PageError::Internal(e.into())
    }
}

/// Render `404.html` / `500.html` for responses produced by `PageError`
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|AuthenticatedUser(user)| user.clone());
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let Some(ErrorPage(status)) = response.extensions().get::<ErrorPage>().copied() else {
        return response;
    };

    let template = if status == StatusCode::NOT_FOUND {
        "404.html"
    } else {
        "500.html"
    };
    let mut context = TeraContext::new();
    StandardTemplateVars::new(path)
        .with_user(user.as_ref())
        .apply(&mut context);

    let html = state.theme_engine.render_with_fallback(template, &context);
    (status, Html(html)).into_response()
}

/// Fallback for unmatched routes
pub async fn not_found() -> PageError {
    PageError::NotFound
}

// ============================================================================
// Tests
// ============================================================================
