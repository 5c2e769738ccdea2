//! Page handlers.
//!
//! Every page is rendered through [`AppState::page`], so the security
//! headers are always present and a render failure is a clean `500`.

use axum::{
    extract::State,
    http::{Extensions, HeaderMap, StatusCode},
    response::Response,
    Form,
};
use serde::Deserialize;

use crate::http::error::{AppError, AppResult};
use crate::http::middleware::CsrfToken;
use crate::http::request::client_ip;
use crate::http::response::{redirect_found, HOME_PATH};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::templates::Context;

pub const HOME_TITLE: &str = "GWS: Go Web Server";
pub const ABOUT_TITLE: &str = "About GWS";
const LOGIN_TITLE: &str = "Sign in";
const ACCOUNT_TITLE: &str = "Your account";
const ACCOUNT_PATH: &str = "/account";

/// Longest accepted username, in characters.
pub const MAX_USERNAME_CHARS: usize = 64;

pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let user = state.sessions.logged_in_user(&headers);
    let greeting = if user.is_empty() {
        "Welcome, guest.".to_string()
    } else {
        format!("Welcome back, {}.", user)
    };

    state.page(
        "home",
        &Context::new().with("title", HOME_TITLE).with("greeting", greeting),
        HeaderMap::new(),
    )
}

pub async fn about(State(state): State<AppState>) -> AppResult<Response> {
    state.page(
        "about",
        &Context::new()
            .with("title", ABOUT_TITLE)
            .with("about", "A small web server with encrypted cookie sessions."),
        HeaderMap::new(),
    )
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Page Not Found")
}

fn login_page(state: &AppState, token: &CsrfToken, error: &str) -> AppResult<Response> {
    state.page(
        "login",
        &Context::new()
            .with("title", LOGIN_TITLE)
            .with("error", error)
            .with("csrf_field", token.form_field()),
        HeaderMap::new(),
    )
}

pub async fn login_form(
    State(state): State<AppState>,
    token: CsrfToken,
    headers: HeaderMap,
) -> AppResult<Response> {
    if state.sessions.logged_in(&headers) {
        return Ok(redirect_found(ACCOUNT_PATH));
    }
    login_page(&state, &token, "")
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
}

/// Trimmed username, if acceptable.
pub fn valid_username(raw: &str) -> Option<&str> {
    let name = raw.trim();
    (!name.is_empty() && name.chars().count() <= MAX_USERNAME_CHARS).then_some(name)
}

pub async fn login_submit(
    State(state): State<AppState>,
    token: CsrfToken,
    headers: HeaderMap,
    extensions: Extensions,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let client = client_ip(&headers, &extensions);
    let Some(username) = valid_username(&form.username) else {
        tracing::info!(client = ?client, "Rejected login with invalid username");
        metrics::record_session_event("login", "rejected");
        let mut response = login_page(
            &state,
            &token,
            "Enter a username of at most 64 characters.",
        )?;
        *response.status_mut() = StatusCode::BAD_REQUEST;
        return Ok(response);
    };

    let mut response = redirect_found(ACCOUNT_PATH);
    if let Err(e) = state.sessions.login(response.headers_mut(), &headers, username) {
        metrics::record_session_event("login", "error");
        return Err(AppError::Session(e));
    }

    tracing::info!(user = %username, client = ?client, "User logged in");
    metrics::record_session_event("login", "ok");
    Ok(response)
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
) -> AppResult<Response> {
    let user = state.sessions.logged_in_user(&headers);

    let mut response = redirect_found(HOME_PATH);
    if let Err(e) = state.sessions.logout(response.headers_mut(), &headers) {
        metrics::record_session_event("logout", "error");
        return Err(AppError::Session(e));
    }

    tracing::info!(
        user = %user,
        client = ?client_ip(&headers, &extensions),
        "User logged out"
    );
    metrics::record_session_event("logout", "ok");
    Ok(response)
}

pub async fn account(
    State(state): State<AppState>,
    token: CsrfToken,
    headers: HeaderMap,
) -> AppResult<Response> {
    let mut refreshed = HeaderMap::new();
    if !state.sessions.is_logged_in(&mut refreshed, &headers) {
        return Ok(redirect_found(HOME_PATH));
    }

    state.page(
        "account",
        &Context::new()
            .with("title", ACCOUNT_TITLE)
            .with("username", state.sessions.logged_in_user(&headers))
            .with("csrf_field", token.form_field()),
        refreshed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert_eq!(valid_username("  alice "), Some("alice"));
        assert_eq!(valid_username("   "), None);
        assert_eq!(valid_username(""), None);
        assert_eq!(valid_username(&"é".repeat(64)), Some("é".repeat(64).as_str()));
        assert_eq!(valid_username(&"a".repeat(65)), None);
    }
}
