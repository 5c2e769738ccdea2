//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

use crate::config::schema::{GwsConfig, Secret};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the listen address.
pub const ENV_LISTEN_ADDR: &str = "GWS_LISTEN_ADDR";
/// Older spelling of [`ENV_LISTEN_ADDR`], still honoured.
pub const ENV_LISTEN_ADDR_LEGACY: &str = "GWSLISTENADDR";
pub const ENV_SESSION_SECRET: &str = "GWS_SESSION_SECRET";
pub const ENV_CSRF_SECRET: &str = "GWS_CSRF_SECRET";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from a TOML file, or defaults when no file is given.
///
/// The result is not validated yet: environment and CLI overlays still
/// have to be applied.
pub fn load_config(path: Option<&Path>) -> Result<GwsConfig, ConfigError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)
        }
        None => Ok(GwsConfig::default()),
    }
}

/// Overlay values from the process environment.
pub fn apply_env(config: &mut GwsConfig) {
    apply_env_from(config, |key| std::env::var(key).ok());
}

/// Overlay values from an arbitrary variable lookup.
pub fn apply_env_from<F>(config: &mut GwsConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(addr) = non_empty(ENV_LISTEN_ADDR).or_else(|| non_empty(ENV_LISTEN_ADDR_LEGACY)) {
        config.listener.bind_address = addr;
    }
    if let Some(secret) = non_empty(ENV_SESSION_SECRET) {
        config.session.secret = Secret::new(secret);
    }
    if let Some(secret) = non_empty(ENV_CSRF_SECRET) {
        config.session.csrf_secret = Secret::new(secret);
    }
}

/// Replace unset secrets with random per-process values.
///
/// Returns the names of the fields that were generated. Sessions signed with
/// a generated secret do not survive a restart.
pub fn fill_missing_secrets(config: &mut GwsConfig) -> Vec<&'static str> {
    let mut generated = Vec::new();
    if config.session.secret.is_empty() {
        config.session.secret = random_secret();
        generated.push("session.secret");
    }
    if config.session.csrf_secret.is_empty() {
        config.session.csrf_secret = random_secret();
        generated.push("session.csrf_secret");
    }
    generated
}

/// Normalize and validate the resolved configuration.
///
/// A listen address with an empty host (`:8080`) binds every interface.
pub fn finalize(mut config: GwsConfig) -> Result<GwsConfig, ConfigError> {
    if let Some(port) = config.listener.bind_address.strip_prefix(':') {
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn random_secret() -> Secret {
    let mut bytes = [0u8; 48];
    OsRng.fill_bytes(&mut bytes);
    Secret::new(URL_SAFE_NO_PAD.encode(bytes))
}
