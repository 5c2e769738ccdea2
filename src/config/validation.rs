//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject placeholder and weak secrets
//! - Validate value ranges (timeouts > 0, sane cache offsets)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GwsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{GwsConfig, Secret};

/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Ten years; anything longer is almost certainly a typo.
const MAX_CACHE_SECS: u64 = 10 * 366 * 24 * 3600;

/// One year; sessions are meant to be short-lived.
const MAX_SESSION_SECS: u64 = 366 * 24 * 3600;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a fully resolved configuration.
pub fn validate_config(config: &GwsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::new("listener.bind_address", "must not be empty"));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }

    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::new("timeouts.read_secs", "must be greater than 0"));
    }
    if config.timeouts.write_secs == 0 {
        errors.push(ValidationError::new("timeouts.write_secs", "must be greater than 0"));
    }

    let session = &config.session;
    if session.cookie_name.is_empty()
        || !session
            .cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        errors.push(ValidationError::new(
            "session.cookie_name",
            "must be non-empty and contain only [A-Za-z0-9_.-]",
        ));
    }
    if session.max_age_secs == 0 {
        errors.push(ValidationError::new("session.max_age_secs", "must be greater than 0"));
    } else if session.max_age_secs > MAX_SESSION_SECS {
        errors.push(ValidationError::new(
            "session.max_age_secs",
            "session lifetime exceeds one year",
        ));
    }
    check_secret(&mut errors, "session.secret", &session.secret);
    check_secret(&mut errors, "session.csrf_secret", &session.csrf_secret);
    if !session.secret.is_empty() && session.secret == session.csrf_secret {
        errors.push(ValidationError::new(
            "session.csrf_secret",
            "must differ from session.secret",
        ));
    }

    for (i, rule) in config.cache.rules.iter().enumerate() {
        let field = format!("cache.rules[{}]", i);
        if !rule.path_prefix.starts_with('/') {
            errors.push(ValidationError::new(
                format!("{}.path_prefix", field),
                "must start with '/'",
            ));
        }
        if rule.max_age_secs > MAX_CACHE_SECS || rule.expires_secs > MAX_CACHE_SECS {
            errors.push(ValidationError::new(field, "cache lifetime exceeds ten years"));
        }
    }
    let default = &config.cache.default;
    if default.max_age_secs > MAX_CACHE_SECS || default.expires_secs > MAX_CACHE_SECS {
        errors.push(ValidationError::new("cache.default", "cache lifetime exceeds ten years"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_secret(errors: &mut Vec<ValidationError>, field: &str, secret: &Secret) {
    let value = secret.expose();
    if value.is_empty() {
        errors.push(ValidationError::new(field, "must be set"));
    } else if value.to_ascii_uppercase().contains("CHANGE") {
        errors.push(ValidationError::new(field, "looks like a placeholder"));
    } else if value.len() < MIN_SECRET_LEN {
        errors.push(ValidationError::new(
            field,
            format!("must be at least {} bytes", MIN_SECRET_LEN),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CacheRuleConfig;

    fn valid() -> GwsConfig {
        let mut config = GwsConfig::default();
        config.session.secret = Secret::new("a".repeat(40));
        config.session.csrf_secret = Secret::new("b".repeat(40));
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let mut config = valid();
        config.session.secret = Secret::new("_CHANGE_THIS_AS_WELL_padding_padding_");
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "session.secret"));
    }

    #[test]
    fn test_short_and_shared_secrets_rejected() {
        let mut config = valid();
        config.session.csrf_secret = Secret::new("short");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least"));

        let mut config = valid();
        config.session.csrf_secret = config.session.secret.clone();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_session_lifetime_bounded() {
        let mut config = valid();
        config.session.max_age_secs = MAX_SESSION_SECS;
        assert!(validate_config(&config).is_ok());

        config.session.max_age_secs = u64::MAX / 2;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "session.max_age_secs");
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.timeouts.read_secs = 0;
        config.timeouts.write_secs = 0;
        config.cache.rules.push(CacheRuleConfig {
            path_prefix: "static".into(),
            max_age_secs: 60,
            expires_secs: 60,
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
