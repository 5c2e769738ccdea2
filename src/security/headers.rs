//! Security response headers for rendered pages.
//!
//! Headers are immutable once the body starts streaming, so these are
//! applied to the response head before the rendered page is attached.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

static HTML_UTF8: HeaderValue = HeaderValue::from_static("text/html; charset=utf-8");
static NOSNIFF: HeaderValue = HeaderValue::from_static("nosniff");
static XSS_BLOCK: HeaderValue = HeaderValue::from_static("1; mode=block");
static SAMEORIGIN: HeaderValue = HeaderValue::from_static("SAMEORIGIN");
static IE_EDGE: HeaderValue = HeaderValue::from_static("IE=edge");
static HSTS: HeaderValue = HeaderValue::from_static("max-age=16070400; includeSubDomains");

const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");
const X_UA_COMPATIBLE: HeaderName = HeaderName::from_static("x-ua-compatible");

/// Which optional headers to add on top of the fixed set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureHeaders {
    /// Add `Strict-Transport-Security`. Only for HTTPS-only domains.
    pub hsts: bool,
}

impl SecureHeaders {
    /// Set the fixed security headers on `headers`.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::CONTENT_TYPE, HTML_UTF8.clone());
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, NOSNIFF.clone());
        headers.insert(X_XSS_PROTECTION, XSS_BLOCK.clone());
        headers.insert(header::X_FRAME_OPTIONS, SAMEORIGIN.clone());
        headers.insert(X_UA_COMPATIBLE, IE_EDGE.clone());

        if self.hsts {
            headers.insert(header::STRICT_TRANSPORT_SECURITY, HSTS.clone());
        }
    }
}
