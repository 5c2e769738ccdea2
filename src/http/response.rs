//! Response construction helpers.
//!
//! # Responsibilities
//! - Format HTTP dates for `Expires` and cookie attributes
//! - Build rendered HTML pages with the security headers in place
//! - Build `302 Found` redirects
//!
//! # Design Decisions
//! - Pages are rendered into a buffer first, so a template error can still
//!   become a clean `500`
//! - Security headers are set on the head before the body is attached

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::security::SecureHeaders;
use crate::templates::{Context, RenderError, TemplateSet};

/// Target of every "go home" redirect.
pub const HOME_PATH: &str = "/";

/// RFC 7231 IMF-fixdate, e.g. `Mon, 01 Jan 2024 10:00:00 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `302 Found` to `location`.
pub fn redirect_found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Render `page` into a `200` HTML response.
///
/// `headers` are merged into the response after the security headers,
/// which is how handlers attach session cookies.
pub fn render_page(
    templates: &TemplateSet,
    secure_headers: &SecureHeaders,
    page: &str,
    context: &Context,
    headers: HeaderMap,
) -> Result<Response, RenderError> {
    let body = templates.render(page, context)?;

    let mut response = Html(body).into_response();
    secure_headers.apply(response.headers_mut());
    for (name, value) in headers.iter() {
        response.headers_mut().append(name, value.clone());
    }
    Ok(response)
}
