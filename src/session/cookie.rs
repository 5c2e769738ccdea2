//! `Cookie` / `Set-Cookie` header plumbing.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};

use crate::http::response::http_date;

/// Attributes written with every session cookie.
#[derive(Debug, Clone)]
pub struct CookieAttributes {
    pub name: String,
    pub path: String,
    pub max_age_secs: u64,
    pub http_only: bool,
    pub secure: bool,
}

impl CookieAttributes {
    /// Render a `Set-Cookie` value carrying `value`.
    pub fn set_cookie(&self, value: &str) -> String {
        let expires = i64::try_from(self.max_age_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|age| Utc::now().checked_add_signed(age))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut cookie = format!(
            "{}={}; Path={}; Expires={}; Max-Age={}",
            self.name,
            value,
            self.path,
            http_date(expires),
            self.max_age_secs
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax");
        cookie
    }
}

/// First value of cookie `name` across all `Cookie` headers.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"'))
}

/// Replace cookie `name` in the request's `Cookie` headers with `value`.
///
/// Other cookies are preserved and folded into a single header. Returns
/// false, leaving the headers untouched, when the result is not a valid
/// header value.
pub fn replace_cookie(headers: &mut HeaderMap, name: &str, value: &str) -> bool {
    let mut pairs: Vec<String> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split_once('=').map_or(true, |(k, _)| k != name))
        .map(str::to_string)
        .collect();
    pairs.push(format!("{}={}", name, value));

    match HeaderValue::from_str(&pairs.join("; ")) {
        Ok(joined) => {
            headers.remove(header::COOKIE);
            headers.insert(header::COOKIE, joined);
            true
        }
        Err(e) => {
            tracing::warn!(cookie = name, error = %e, "Cannot rewrite Cookie header");
            false
        }
    }
}

/// Whether `headers` already carry a `Set-Cookie` for `name`.
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split_once('='))
        .any(|(k, _)| k.trim() == name)
}

/// Set `value` as the only `Set-Cookie` for `name`, keeping other cookies.
pub fn put_set_cookie(headers: &mut HeaderMap, name: &str, value: HeaderValue) {
    if sets_cookie(headers, name) {
        let others: Vec<HeaderValue> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter(|v| {
                v.to_str()
                    .ok()
                    .and_then(|s| s.split_once('='))
                    .map_or(true, |(k, _)| k.trim() != name)
            })
            .cloned()
            .collect();
        headers.remove(header::SET_COOKIE);
        for other in others {
            headers.append(header::SET_COOKIE, other);
        }
    }
    headers.append(header::SET_COOKIE, value);
}
