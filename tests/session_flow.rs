//! Login, logout and anti-forgery behaviour through the full router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

const FORM: &str = "application/x-www-form-urlencoded";

async fn get(path: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::get(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    common::router()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(path: &str, cookie: Option<&str>, body: String) -> Response {
    let mut builder = Request::post(path).header(header::CONTENT_TYPE, FORM);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    common::router()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// Fetch the login form: the anonymous session cookie and its token.
async fn anonymous_session() -> (String, String) {
    let res = get("/login", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = common::cookie_pair(res.headers());
    let token = common::csrf_token(&common::body_string(res).await);
    (cookie, token)
}

async fn logged_in_session(username: &str) -> String {
    let (cookie, token) = anonymous_session().await;
    let res = post_form(
        "/login",
        Some(&cookie),
        format!("username={}&csrf_token={}", username, token),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/account");
    common::cookie_pair(res.headers())
}

#[tokio::test]
async fn test_login_then_account() {
    let cookie = logged_in_session("alice").await;

    let res = get("/account", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    // Every positive check re-issues the cookie.
    assert!(res.headers().contains_key(header::SET_COOKIE));
    assert!(common::body_string(res).await.contains("alice"));

    let res = get("/", Some(&cookie)).await;
    assert!(common::body_string(res).await.contains("Welcome back, alice."));
}

#[tokio::test]
async fn test_login_form_redirects_when_logged_in() {
    let cookie = logged_in_session("alice").await;

    let res = get("/login", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/account");
}

#[tokio::test]
async fn test_logout_with_token() {
    let cookie = logged_in_session("bob").await;
    let res = get("/account", Some(&cookie)).await;
    let token = common::csrf_token(&common::body_string(res).await);

    let res = post_form("/logout", Some(&cookie), format!("csrf_token={}", token)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/");
    let logged_out = common::cookie_pair(res.headers());

    let res = get("/account", Some(&logged_out)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[header::LOCATION], "/");

    let res = get("/", Some(&logged_out)).await;
    assert!(common::body_string(res).await.contains("Welcome, guest."));
}

#[tokio::test]
async fn test_logout_without_token_is_forbidden() {
    let cookie = logged_in_session("carol").await;

    let res = post_form("/logout", Some(&cookie), String::new()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(!res.headers().contains_key(header::SET_COOKIE));
    assert_eq!(common::body_string(res).await, "Forbidden - CSRF token invalid");

    // Still logged in.
    assert_eq!(get("/account", Some(&cookie)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_post_without_session_is_forbidden() {
    let res = post_form("/logout", None, String::new()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = post_form("/login", None, "username=eve".to_string()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_is_bound_to_session() {
    let (cookie, _) = anonymous_session().await;
    let (_, other_token) = anonymous_session().await;

    let res = post_form(
        "/login",
        Some(&cookie),
        format!("username=mallory&csrf_token={}", other_token),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_rotates_token() {
    let (cookie, token) = anonymous_session().await;
    let res = post_form(
        "/login",
        Some(&cookie),
        format!("username=dave&csrf_token={}", token),
    )
    .await;
    let logged_in = common::cookie_pair(res.headers());

    // The pre-login token no longer matches the rotated session.
    let res = post_form("/logout", Some(&logged_in), format!("csrf_token={}", token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_rejects_blank_username() {
    let (cookie, token) = anonymous_session().await;

    let res = post_form(
        "/login",
        Some(&cookie),
        format!("username=+++&csrf_token={}", token),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(!res.headers().contains_key(header::SET_COOKIE));
    assert!(common::body_string(res).await.contains("at most 64 characters"));
}

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() {
    let cookie = logged_in_session("alice").await;
    let (name, value) = cookie.split_once('=').unwrap();
    let mut bytes = value.as_bytes().to_vec();
    let last = bytes.len() - 1;
    bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
    let tampered = format!("{}={}", name, String::from_utf8(bytes).unwrap());

    let res = get("/account", Some(&tampered)).await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let res = get("/", Some(&tampered)).await;
    assert_eq!(res.status(), StatusCode::OK);
    // A replacement anonymous session is issued.
    assert!(res.headers().contains_key(header::SET_COOKIE));
    assert!(common::body_string(res).await.contains("Welcome, guest."));
}

#[tokio::test]
async fn test_account_gzip_when_accepted() {
    let cookie = logged_in_session("alice").await;

    let res = common::router()
        .oneshot(
            Request::get("/account")
                .header(header::COOKIE, cookie)
                .header(header::ACCEPT_ENCODING, "gzip")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_ENCODING], "gzip");
    let html = common::gunzip(&common::body_bytes(res).await).await;
    assert!(html.contains("alice"));
}
