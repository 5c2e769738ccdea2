//! Cache-Control / Expires middleware.
//!
//! Looks the request path up in an ordered policy table (first match wins,
//! a default always applies) and annotates the response.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::config::CacheConfig;
use crate::http::response::http_date;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// Lifetimes applied to a matched response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheDirective {
    /// `max-age` in seconds.
    pub max_age_secs: u64,
    /// Offset from now for `Expires`, in seconds.
    pub expires_secs: u64,
}

impl CacheDirective {
    /// `Cache-Control` and `Expires` values relative to `now`.
    pub fn header_values(&self, now: DateTime<Utc>) -> (HeaderValue, HeaderValue) {
        let cache_control = HeaderValue::from_str(&format!("public, max-age={}", self.max_age_secs))
            .expect("digits are valid header bytes");
        let expires_at = i64::try_from(self.expires_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|offset| now.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let expires = HeaderValue::from_str(&http_date(expires_at))
            .expect("HTTP dates are valid header bytes");
        (cache_control, expires)
    }
}

#[derive(Debug)]
struct CacheRule {
    matcher: Box<dyn Matcher>,
    directive: CacheDirective,
}

/// Ordered cache policy table.
#[derive(Debug)]
pub struct CachePolicy {
    rules: Vec<CacheRule>,
    default: CacheDirective,
}

impl CachePolicy {
    /// An empty table that always yields `default`.
    pub fn new(default: CacheDirective) -> Self {
        Self { rules: Vec::new(), default }
    }

    /// Append a rule; earlier rules take precedence.
    pub fn with_rule(mut self, matcher: impl Matcher + 'static, directive: CacheDirective) -> Self {
        self.rules.push(CacheRule { matcher: Box::new(matcher), directive });
        self
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let default = CacheDirective {
            max_age_secs: config.default.max_age_secs,
            expires_secs: config.default.expires_secs,
        };
        config.rules.iter().fold(Self::new(default), |policy, rule| {
            policy.with_rule(
                PathPrefixMatcher::new(rule.path_prefix.clone()),
                CacheDirective {
                    max_age_secs: rule.max_age_secs,
                    expires_secs: rule.expires_secs,
                },
            )
        })
    }

    pub fn lookup(&self, path: &str) -> CacheDirective {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map(|rule| rule.directive)
            .unwrap_or(self.default)
    }
}

/// Annotate the response with the policy matching the request path.
///
/// Values are computed before delegating; headers the handler set itself
/// are left alone.
pub async fn apply_cache_policy(
    State(policy): State<Arc<CachePolicy>>,
    request: Request,
    next: Next,
) -> Response {
    // Nested services see a stripped URI; match on what the client asked for.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let (cache_control, expires) = policy.lookup(&path).header_values(Utc::now());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.entry(header::CACHE_CONTROL).or_insert(cache_control);
    headers.entry(header::EXPIRES).or_insert(expires);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheRuleConfig;
    use crate::routing::matcher::ExactPathMatcher;
    use chrono::TimeZone;

    fn directive(max_age_secs: u64, expires_secs: u64) -> CacheDirective {
        CacheDirective { max_age_secs, expires_secs }
    }

    #[test]
    fn test_first_match_wins() {
        let policy = CachePolicy::new(directive(1, 1))
            .with_rule(ExactPathMatcher::new("/static/app.js"), directive(2, 2))
            .with_rule(PathPrefixMatcher::new("/static/"), directive(3, 3));

        assert_eq!(policy.lookup("/static/app.js"), directive(2, 2));
        assert_eq!(policy.lookup("/static/app.css"), directive(3, 3));
        assert_eq!(policy.lookup("/about"), directive(1, 1));
    }

    #[test]
    fn test_from_config_defaults() {
        let mut config = CacheConfig::default();
        config.rules.push(CacheRuleConfig {
            path_prefix: "/static/fonts/".into(),
            max_age_secs: 60,
            expires_secs: 30,
        });
        let policy = CachePolicy::from_config(&config);

        assert_eq!(policy.lookup("/static/fonts/a.woff"), directive(60, 30));
        assert_eq!(policy.lookup("/static/css/style.css"), directive(370 * 86_400, 367 * 86_400));
    }

    #[test]
    fn test_header_values() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let (cache_control, expires) = directive(600, 3600).header_values(now);

        assert_eq!(cache_control, "public, max-age=600");
        assert_eq!(expires, "Mon, 01 Jan 2024 11:00:00 GMT");
    }
}
