//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and check the page templates
//! - Build the server from resolved configuration
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::GwsConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::templates::{TemplateError, TemplateSet};

/// Pages every deployment must ship.
pub const REQUIRED_PAGES: &[&str] = &["home", "about", "login", "account"];

/// Fatal startup failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("template error: {0}")]
    Templates(#[from] TemplateError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Parse the templates and build the server.
pub fn build_server(config: &GwsConfig) -> Result<HttpServer, StartupError> {
    let templates = TemplateSet::load(Path::new(&config.paths.templates))?;
    templates.require(REQUIRED_PAGES)?;
    Ok(HttpServer::new(config, templates))
}

/// Bind the configured listen address.
pub async fn bind(config: &GwsConfig) -> Result<TcpListener, StartupError> {
    let address = &config.listener.bind_address;
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })
}

/// Build, bind and serve until `shutdown` is triggered.
pub async fn run(config: &GwsConfig, shutdown: Arc<Shutdown>) -> Result<(), StartupError> {
    let server = build_server(config)?;
    tracing::info!(
        templates = %config.paths.templates,
        static_dir = %config.paths.static_dir,
        "Site loaded"
    );

    let listener = bind(config).await?;
    server
        .run(listener, shutdown.signalled())
        .await
        .map_err(StartupError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_template_dir_is_fatal() {
        let mut config = GwsConfig::default();
        config.paths.templates = "/definitely/not/here".into();
        assert!(matches!(
            build_server(&config),
            Err(StartupError::Templates(TemplateError::Io { .. }))
        ));
    }

    #[tokio::test]
    async fn test_bind_error_names_address() {
        let mut config = GwsConfig::default();
        config.listener.bind_address = "not an address".into();
        let err = bind(&config).await.unwrap_err();
        assert!(err.to_string().contains("not an address"));
    }
}
