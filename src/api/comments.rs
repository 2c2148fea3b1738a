//! Comment edit and delete pages
//!
//! Both routes share the same access rules: anonymous users are sent to the
//! login page, and anyone but the comment's author gets a 404.

use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        OriginalUri, Path, State,
    },
    response::{IntoResponse, Response},
    Form,
};
use serde::Serialize;

use super::middleware::{found, login_redirect, AppState, MaybeUser, PageError};
use super::news::{comments_url, path_id, submitted};
use crate::models::{Comment, CommentForm, CommentFormData, User};
use crate::services::CommentServiceError;

/// Context of the edit page
#[derive(Debug, Serialize)]
pub struct CommentEditPage {
    pub comment: Comment,
    pub form: CommentForm,
}

/// Context of the delete confirmation page
#[derive(Debug, Serialize)]
pub struct CommentDeletePage {
    pub comment: Comment,
}

/// Outcome of the access check on an edit/delete route
enum Access {
    Granted(User, Comment),
    /// Response to send instead (login redirect)
    Denied(Response),
}

/// Resolve the comment for the current user, or decide the response.
async fn check_access(
    state: &AppState,
    path: Result<Path<i64>, PathRejection>,
    user: Option<User>,
    uri: &OriginalUri,
) -> Result<Access, PageError> {
    let Some(user) = user else {
        let next = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        return Ok(Access::Denied(login_redirect(next)));
    };

    let id = path_id(path)?;
    let comment = state.comment_service.get_owned(id, &user).await?;
    Ok(Access::Granted(user, comment))
}

/// `GET /edit_comment/{id}/`
pub async fn edit_form(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    MaybeUser(user): MaybeUser,
    uri: OriginalUri,
) -> Result<Response, PageError> {
    let (user, comment) = match check_access(&state, path, user, &uri).await? {
        Access::Granted(user, comment) => (user, comment),
        Access::Denied(response) => return Ok(response),
    };

    let page = CommentEditPage {
        form: CommentForm::bound(comment.text.clone()),
        comment,
    };
    Ok(state
        .render("comment_edit.html", &page, Some(&user), uri.path())?
        .into_response())
}

/// `POST /edit_comment/{id}/`
pub async fn edit(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    MaybeUser(user): MaybeUser,
    uri: OriginalUri,
    form: Result<Form<CommentFormData>, FormRejection>,
) -> Result<Response, PageError> {
    let (user, comment) = match check_access(&state, path, user, &uri).await? {
        Access::Granted(user, comment) => (user, comment),
        Access::Denied(response) => return Ok(response),
    };

    match state
        .comment_service
        .update(comment.clone(), submitted(form))
        .await
    {
        Ok(updated) => Ok(found(&comments_url(updated.news_id))),
        Err(CommentServiceError::Validation(form)) => {
            let page = CommentEditPage { comment, form };
            Ok(state
                .render("comment_edit.html", &page, Some(&user), uri.path())?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /delete_comment/{id}/`
pub async fn delete_confirm(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    MaybeUser(user): MaybeUser,
    uri: OriginalUri,
) -> Result<Response, PageError> {
    let (user, comment) = match check_access(&state, path, user, &uri).await? {
        Access::Granted(user, comment) => (user, comment),
        Access::Denied(response) => return Ok(response),
    };

    let page = CommentDeletePage { comment };
    Ok(state
        .render("comment_delete.html", &page, Some(&user), uri.path())?
        .into_response())
}

/// `POST` or `DELETE /delete_comment/{id}/`
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    MaybeUser(user): MaybeUser,
    uri: OriginalUri,
) -> Result<Response, PageError> {
    let comment = match check_access(&state, path, user, &uri).await? {
        Access::Granted(_, comment) => comment,
        Access::Denied(response) => return Ok(response),
    };

    state.comment_service.delete(&comment).await?;
    Ok(found(&comments_url(comment.news_id)))
}
