//! Data models
//!
//! This module contains all data structures used throughout the Newsroom site.
//! Models represent:
//! - Database entities (News, Comment, User, Session)
//! - HTML form types with their validation errors
//! - Internal data transfer objects

mod comment;
mod form;
mod news;
mod session;
mod user;

pub use comment::{Comment, CommentWithAuthor, NewComment};
pub use form::{
    CommentForm, CommentFormData, FormErrors, LoginForm, LoginFormData, SignupForm,
    SignupFormData, NON_FIELD_ERRORS, REQUIRED_FIELD,
};
pub use news::{CreateNewsInput, News, NewsSummary, TITLE_MAX_LEN};
pub use session::Session;
pub use user::User;
