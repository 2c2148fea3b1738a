//! API layer - HTTP handlers and routing
//!
//! Server-rendered pages of the news site:
//! - Home listing and news detail with comments
//! - Comment edit/delete pages, restricted to the comment's author
//! - Login, logout and signup pages

pub mod auth;
pub mod comments;
pub mod middleware;
pub mod news;

#[cfg(test)]
mod tests;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use middleware::{AppState, PageError};

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(news::home))
        .route("/news/{id}/", get(news::detail).post(news::create_comment))
        .route(
            "/edit_comment/{id}/",
            get(comments::edit_form).post(comments::edit),
        )
        .route(
            "/delete_comment/{id}/",
            get(comments::delete_confirm)
                .post(comments::delete)
                .delete(comments::delete),
        )
        .nest("/auth", auth::router())
        .fallback(middleware::not_found)
        // Innermost: turns PageError markers into themed pages
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
