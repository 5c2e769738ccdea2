//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the web server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GwsConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Read/write phase timeouts.
    pub timeouts: TimeoutConfig,

    /// Session cookie settings and secrets.
    pub session: SessionConfig,

    /// Cache policy table for cacheable routes.
    pub cache: CacheConfig,

    /// Template and static asset locations.
    pub paths: PathsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Response hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "localhost:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "localhost:8080".to_string(),
            max_body_bytes: 1 << 20,
        }
    }
}

/// Timeout configuration.
///
/// Both phases are bounded so a slow or vanished client cannot pin a
/// connection forever.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to receive the request body, in seconds.
    pub read_secs: u64,

    /// Time allowed to produce the response, in seconds.
    pub write_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 15,
            write_secs: 20,
        }
    }
}

/// A secret value that never shows up in logs.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "Secret(<unset>)")
        } else {
            write!(f, "Secret(<redacted>)")
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Secret the cookie encryption key is derived from.
    /// Usually supplied through `GWS_SESSION_SECRET`.
    pub secret: Secret,

    /// Secret the anti-forgery key is derived from.
    /// Usually supplied through `GWS_CSRF_SECRET`.
    pub csrf_secret: Secret,

    /// Session lifetime from issuance, in seconds.
    pub max_age_secs: u64,

    /// Only send the cookie over HTTPS.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "gws_session".to_string(),
            secret: Secret::default(),
            csrf_secret: Secret::default(),
            max_age_secs: 4 * 60 * 60,
            secure: true,
        }
    }
}

/// One entry of the cache policy table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheRuleConfig {
    /// Path prefix the rule applies to.
    pub path_prefix: String,

    /// Value of `max-age` in `Cache-Control`, in seconds.
    pub max_age_secs: u64,

    /// Offset from now used for the `Expires` header, in seconds.
    pub expires_secs: u64,
}

/// Fallback policy used when no rule matches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheDefaultConfig {
    pub max_age_secs: u64,
    pub expires_secs: u64,
}

impl Default for CacheDefaultConfig {
    fn default() -> Self {
        // Long-lived assets: rename files when they change.
        Self {
            max_age_secs: 370 * 24 * 3600,
            expires_secs: 367 * 24 * 3600,
        }
    }
}

/// Cache policy table configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Ordered rules, first match wins.
    pub rules: Vec<CacheRuleConfig>,

    /// Policy applied when no rule matches.
    pub default: CacheDefaultConfig,
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `*.html` templates.
    pub templates: String,

    /// Directory served under `/static/`.
    pub static_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates: "tmpl".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Send `Strict-Transport-Security` on rendered pages.
    /// Only enable for HTTPS-only domains.
    pub hsts: bool,
}
