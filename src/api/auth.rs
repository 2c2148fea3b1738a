//! Authentication pages
//!
//! - `GET|POST /auth/login/`
//! - `GET|POST /auth/logout/`
//! - `GET|POST /auth/signup/`

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::{Deserialize, Serialize};

use super::middleware::{
    clear_session_cookie, extract_session_token, found, is_safe_next, session_cookie, AppState,
    MaybeUser, PageError, LOGIN_URL,
};
use crate::models::{
    FormErrors, LoginForm, LoginFormData, SignupForm, SignupFormData, NON_FIELD_ERRORS,
};
use crate::services::user::INVALID_LOGIN;
use crate::services::UserServiceError;

/// Authentication routes, mounted under `/auth`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/", get(login_form).post(login))
        .route("/logout/", get(logout).post(logout))
        .route("/signup/", get(signup_form).post(signup))
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub form: LoginForm,
}

#[derive(Debug, Serialize)]
pub struct SignupPage {
    pub form: SignupForm,
}

/// Empty page context
#[derive(Debug, Serialize)]
pub struct LogoutPage {}

/// Keep `next` only when it points back into the site
fn safe_next(next: Option<String>) -> Option<String> {
    next.filter(|n| is_safe_next(n))
}

/// `GET /auth/login/`
async fn login_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    query: Result<Query<NextQuery>, QueryRejection>,
) -> Result<Response, PageError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let page = LoginPage {
        form: LoginForm {
            next: safe_next(query.next),
            ..LoginForm::default()
        },
    };

    Ok(state
        .render("login.html", &page, user.as_ref(), LOGIN_URL)?
        .into_response())
}

/// `POST /auth/login/`
///
/// On success the session cookie is set and the browser goes to `next`
/// (or the home page).
async fn login(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    form: Result<Form<LoginFormData>, FormRejection>,
) -> Result<Response, PageError> {
    let data = form.map(|Form(d)| d).unwrap_or_default();
    let next = safe_next(data.next.clone());

    let errors = match state.user_service.login(&data).await {
        Ok((_, session)) => {
            let cookie = session_cookie(
                &session.id,
                state.user_service.session_ttl().num_seconds(),
            );
            let mut response = found(next.as_deref().unwrap_or("/"));
            response.headers_mut().insert(
                header::SET_COOKIE,
                HeaderValue::from_str(&cookie)
                    .map_err(|e| anyhow::anyhow!("Invalid session cookie: {}", e))?,
            );
            return Ok(response);
        }
        Err(UserServiceError::ValidationError(errors)) => errors,
        Err(UserServiceError::AuthenticationError) => {
            let mut errors = FormErrors::default();
            errors.add(NON_FIELD_ERRORS, INVALID_LOGIN);
            errors
        }
        Err(e) => return Err(e.into()),
    };

    let page = LoginPage {
        form: LoginForm {
            username: data.username,
            next,
            errors,
        },
    };
    Ok(state
        .render("login.html", &page, current.as_ref(), LOGIN_URL)?
        .into_response())
}

/// `GET|POST /auth/logout/`
///
/// Closes the current session (if any) and shows the logged-out page.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }

    let html = state.render("logout.html", &LogoutPage {}, None, "/auth/logout/")?;
    let mut response = html.into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&clear_session_cookie())
            .map_err(|e| anyhow::anyhow!("Invalid session cookie: {}", e))?,
    );
    Ok(response)
}

/// `GET /auth/signup/`
async fn signup_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, PageError> {
    let page = SignupPage {
        form: SignupForm::default(),
    };

    Ok(state
        .render("signup.html", &page, user.as_ref(), "/auth/signup/")?
        .into_response())
}

/// `POST /auth/signup/`
async fn signup(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    form: Result<Form<SignupFormData>, FormRejection>,
) -> Result<Response, PageError> {
    let data = form.map(|Form(d)| d).unwrap_or_default();

    match state.user_service.signup(&data).await {
        Ok(_) => Ok(found(LOGIN_URL)),
        Err(UserServiceError::ValidationError(errors)) => {
            let page = SignupPage {
                form: SignupForm {
                    username: data.username,
                    errors,
                },
            };
            Ok(state
                .render("signup.html", &page, current.as_ref(), "/auth/signup/")?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
