//! News pages
//!
//! - `GET /` - home listing
//! - `GET /news/{id}/` - news item with its comments
//! - `POST /news/{id}/` - add a comment (authenticated users only)

use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        Path, State,
    },
    response::{IntoResponse, Response},
    Form,
};
use serde::Serialize;

use super::middleware::{found, login_redirect, AppState, MaybeUser, PageError};
use crate::models::{CommentForm, CommentFormData, CommentWithAuthor, News, NewsSummary, User};
use crate::services::CommentServiceError;

/// Context of the home page
#[derive(Debug, Serialize)]
pub struct HomePage {
    pub object_list: Vec<NewsSummary>,
}

/// Context of the news detail page
#[derive(Debug, Serialize)]
pub struct DetailPage {
    pub news: News,
    pub comments: Vec<CommentWithAuthor>,
    /// Comment form, only offered to authenticated users
    pub form: Option<CommentForm>,
}

impl DetailPage {
    pub fn new(news: News, comments: Vec<CommentWithAuthor>, user: Option<&User>) -> Self {
        Self {
            news,
            comments,
            form: user.map(|_| CommentForm::empty()),
        }
    }

    /// Replace the empty form with a submitted one
    pub fn with_form(mut self, form: CommentForm) -> Self {
        self.form = Some(form);
        self
    }
}

/// Path of the detail page, used for redirects and login `next`
pub fn detail_url(news_id: i64) -> String {
    format!("/news/{}/", news_id)
}

/// Detail page scrolled to the comments section
pub fn comments_url(news_id: i64) -> String {
    format!("/news/{}/#comments", news_id)
}

/// Ids that do not parse are treated as unknown pages
pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, PageError> {
    path.map(|Path(id)| id).map_err(|_| PageError::NotFound)
}

/// Comment form as submitted. A missing or unreadable body counts as an
/// empty form, which then fails validation like any blank comment.
pub(crate) fn submitted(form: Result<Form<CommentFormData>, FormRejection>) -> CommentForm {
    CommentForm::from(form.map(|Form(data)| data).unwrap_or_default())
}

/// Home page handler
pub async fn home(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, PageError> {
    let page = HomePage {
        object_list: state.news_service.list_home().await?,
    };

    Ok(state.render("home.html", &page, user.as_ref(), "/")?.into_response())
}

/// Build the detail page context for `news_id`
pub async fn detail_page(
    state: &AppState,
    news_id: i64,
    user: Option<&User>,
) -> Result<DetailPage, PageError> {
    let news = state.news_service.get(news_id).await?;
    let comments = state.comment_service.list_for_news(news.id).await?;

    Ok(DetailPage::new(news, comments, user))
}

/// News detail handler
pub async fn detail(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, PageError> {
    let id = path_id(path)?;
    let page = detail_page(&state, id, user.as_ref()).await?;

    Ok(state
        .render("detail.html", &page, user.as_ref(), &detail_url(id))?
        .into_response())
}

/// Comment creation handler
///
/// Anonymous users are sent to log in. An invalid comment re-renders the
/// detail page with the submitted form and its errors.
pub async fn create_comment(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    MaybeUser(user): MaybeUser,
    form: Result<Form<CommentFormData>, FormRejection>,
) -> Result<Response, PageError> {
    let id = path_id(path)?;
    let Some(user) = user else {
        return Ok(login_redirect(&detail_url(id)));
    };

    let news = state.news_service.get(id).await?;

    match state
        .comment_service
        .create(news.id, &user, submitted(form))
        .await
    {
        Ok(_) => Ok(found(&comments_url(news.id))),
        Err(CommentServiceError::Validation(form)) => {
            let page = detail_page(&state, news.id, Some(&user))
                .await?
                .with_form(form);
            Ok(state
                .render("detail.html", &page, Some(&user), &detail_url(id))?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
