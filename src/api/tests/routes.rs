//! Status codes and redirects per route

use axum::http::{header, StatusCode};

use super::fixtures::*;
use crate::services::user::{INVALID_LOGIN, PASSWORD_MISMATCH};

#[tokio::test]
async fn test_pages_availability_for_anonymous_user() {
    let app = TestApp::new().await;
    let detail = detail_url(&app.news);

    for url in ["/", detail.as_str(), "/auth/login/", "/auth/logout/", "/auth/signup/"] {
        let response = app.get(url, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", url);
    }
}

#[tokio::test]
async fn test_availability_for_comment_edit_and_delete() {
    let app = TestApp::new().await;
    let comment = app.comment().await;

    let cases = [
        (&app.author_cookie, StatusCode::OK),
        (&app.reader_cookie, StatusCode::NOT_FOUND),
    ];
    for (cookie, expected) in cases {
        for url in [edit_url(&comment), delete_url(&comment)] {
            let response = app.get(&url, Some(cookie.as_str())).await;
            assert_eq!(response.status(), expected, "GET {}", url);
        }
    }
}

#[tokio::test]
async fn test_edit_page_prefills_text() {
    let app = TestApp::new().await;
    let comment = app.comment().await;

    let html = body_text(app.get(&edit_url(&comment), Some(&app.author_cookie)).await).await;

    assert!(html.contains("id=\"comment-form\""));
    assert!(html.contains(COMMENT_TEXT));
}

#[tokio::test]
async fn test_delete_page_asks_for_confirmation() {
    let app = TestApp::new().await;
    let comment = app.comment().await;

    let html = body_text(app.get(&delete_url(&comment), Some(&app.author_cookie)).await).await;

    assert!(html.contains("id=\"delete-form\""));
    assert_eq!(app.comment_count().await, 1);
}

#[tokio::test]
async fn test_redirect_for_anonymous_client() {
    let app = TestApp::new().await;
    let comment = app.comment().await;

    for url in [edit_url(&comment), delete_url(&comment)] {
        let response = app.get(&url, None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), format!("/auth/login/?next={}", url));
    }
}

#[tokio::test]
async fn test_anonymous_redirect_comes_before_missing_comment() {
    let app = TestApp::new().await;

    let response = app.get("/edit_comment/9999/", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth/login/?next=/edit_comment/9999/");
}

#[tokio::test]
async fn test_unknown_pages_are_not_found() {
    let app = TestApp::new().await;

    for url in ["/news/9999/", "/news/abc/", "/no/such/page/"] {
        let response = app.get(url, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", url);
        assert!(body_text(response).await.contains("Страница не найдена"));
    }

    let response = app.get("/edit_comment/abc/", Some(&app.author_cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_session_is_anonymous() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            &detail_url(&app.news),
            Some("session=not-a-session"),
            &text_form(COMMENT_TEXT),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with("/auth/login/"));
}

#[tokio::test]
async fn test_signup_login_logout_flow() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/auth/signup/",
            None,
            "username=newcomer&password1=s3cret-pass&password2=s3cret-pass",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth/login/");

    let next = detail_url(&app.news);
    let response = app
        .post_form(
            "/auth/login/",
            None,
            &format!("username=newcomer&password=s3cret-pass&next={}", next),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), next);

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("newcomer"));

    let response = app.post_form("/auth/logout/", Some(&cookie), "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(!html.contains("newcomer"));
}

#[tokio::test]
async fn test_login_without_safe_next_goes_home() {
    let app = TestApp::new().await;
    app.post_form(
        "/auth/signup/",
        None,
        "username=traveller&password1=pass-1234&password2=pass-1234",
    )
    .await;

    let response = app
        .post_form(
            "/auth/login/",
            None,
            "username=traveller&password=pass-1234&next=https%3A%2F%2Fevil.example%2F",
        )
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/auth/login/", None, "username=nobody&password=wrong")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_text(response).await.contains(INVALID_LOGIN));
}

#[tokio::test]
async fn test_signup_password_mismatch() {
    let app = TestApp::new().await;

    let response = app
        .post_form(
            "/auth/signup/",
            None,
            "username=someone&password1=first-pass&password2=other-pass",
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(PASSWORD_MISMATCH));
    assert!(html.contains("someone"));
    assert!(app
        .state
        .user_service
        .get_by_username("someone")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_signup_rejects_taken_username() {
    let app = TestApp::new().await;
    let body = format!(
        "username={}&password1=pass-1234&password2=pass-1234",
        urlencoding::encode(&app.author.username)
    );

    let response = app.post_form("/auth/signup/", None, &body).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("id=\"signup-form\""));
}
