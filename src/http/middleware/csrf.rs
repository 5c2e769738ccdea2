//! Anti-forgery protection.
//!
//! # Responsibilities
//! - Make sure every browser holds a session before it sees a form
//! - Expose the request's token to handlers as a [`CsrfToken`] extension
//! - Reject unsafe requests whose token does not match their session
//!
//! # Design Decisions
//! - The token is an HMAC of the session id, so nothing is stored per session
//! - Tokens are accepted from the `x-csrf-token` header or the `csrf_token`
//!   form field of a urlencoded body
//! - A session minted here is also written back into the request's `Cookie`
//!   header so downstream handlers see the same session

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderName, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::GwsConfig;
use crate::observability::metrics;
use crate::security::TokenSigner;
use crate::session::cookie::{replace_cookie, sets_cookie};
use crate::session::SessionStore;

/// Form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";

/// Header carrying the token.
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

const FORBIDDEN_BODY: &str = "Forbidden - CSRF token invalid";

/// Shared state of the CSRF middleware.
pub struct CsrfProtection {
    sessions: SessionStore,
    signer: TokenSigner,
    max_body_bytes: usize,
}

impl CsrfProtection {
    pub fn new(config: &GwsConfig, sessions: SessionStore) -> Self {
        Self {
            sessions,
            signer: TokenSigner::new(config.session.csrf_secret.expose()),
            max_body_bytes: config.listener.max_body_bytes,
        }
    }
}

/// The anti-forgery token bound to the current request's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hidden form input carrying the token.
    pub fn form_field(&self) -> String {
        format!(r#"<input type="hidden" name="{}" value="{}">"#, CSRF_FIELD, self.0)
    }
}

impl<S> FromRequestParts<S> for CsrfToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CsrfToken>().cloned().ok_or_else(|| {
            tracing::error!("CSRF token requested outside the CSRF middleware");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}

/// Safe methods never change state and are never checked.
pub fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn form_token(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == CSRF_FIELD)
        .map(|(_, value)| value.into_owned())
}

fn reject(reason: &'static str, request: &Request) -> Response {
    tracing::warn!(
        method = %request.method(),
        path = %request.uri().path(),
        reason,
        "Rejected request with invalid CSRF token"
    );
    metrics::record_csrf_rejection(reason);
    (StatusCode::FORBIDDEN, FORBIDDEN_BODY).into_response()
}

pub async fn csrf_protect(
    State(csrf): State<Arc<CsrfProtection>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = csrf.sessions.get(request.headers());

    if is_safe(request.method()) {
        let mut minted = None;
        if session.is_new() {
            match csrf.sessions.encode(&session) {
                Ok(value) => {
                    if replace_cookie(request.headers_mut(), csrf.sessions.cookie_name(), &value) {
                        minted = Some(value);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to mint session cookie"),
            }
        }
        request
            .extensions_mut()
            .insert(CsrfToken(csrf.signer.sign(session.id())));

        let mut response = next.run(request).await;
        if let Some(value) = minted {
            // A handler that saved the session itself wins.
            if !sets_cookie(response.headers(), csrf.sessions.cookie_name()) {
                match csrf.sessions.set_cookie_header(&value) {
                    Ok(cookie) => {
                        response.headers_mut().append(header::SET_COOKIE, cookie);
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to attach session cookie"),
                }
            }
        }
        return response;
    }

    if session.is_new() {
        return reject("no_session", &request);
    }

    let token = match header_token(request.headers()) {
        Some(token) => Some(token),
        None if is_form(request.headers()) => {
            let (parts, body) = request.into_parts();
            let bytes = match axum::body::to_bytes(body, csrf.max_body_bytes).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to buffer form body");
                    request = Request::from_parts(parts, Body::empty());
                    return reject("unreadable_body", &request);
                }
            };
            let token = form_token(&bytes);
            request = Request::from_parts(parts, Body::from(bytes));
            token
        }
        None => None,
    };

    let Some(token) = token else {
        return reject("missing_token", &request);
    };
    if !csrf.signer.verify(session.id(), &token) {
        return reject("bad_token", &request);
    }

    request.extensions_mut().insert(CsrfToken(token));
    next.run(request).await
}
