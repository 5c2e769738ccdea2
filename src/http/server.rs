//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared application state (templates, session store)
//! - Build the Axum router with all routes and middleware
//! - Bind the server to a listener and serve until shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::HeaderMap, response::Response, Router};
use tokio::net::TcpListener;

use crate::config::GwsConfig;
use crate::http::error::AppResult;
use crate::http::response::render_page;
use crate::routing::build_router;
use crate::security::SecureHeaders;
use crate::session::SessionStore;
use crate::templates::{Context, TemplateSet};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<TemplateSet>,
    pub sessions: SessionStore,
    pub secure_headers: SecureHeaders,
}

impl AppState {
    pub fn new(config: &GwsConfig, templates: TemplateSet) -> Self {
        Self {
            templates: Arc::new(templates),
            sessions: SessionStore::new(&config.session),
            secure_headers: SecureHeaders {
                hsts: config.security.hsts,
            },
        }
    }

    /// Render `page` with the security headers, merging `headers` in.
    pub fn page(&self, page: &str, context: &Context, headers: HeaderMap) -> AppResult<Response> {
        Ok(render_page(
            &self.templates,
            &self.secure_headers,
            page,
            context,
            headers,
        )?)
    }
}

/// HTTP server for the site.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &GwsConfig, templates: TemplateSet) -> Self {
        let state = AppState::new(config, templates);
        Self {
            router: build_router(config, state),
        }
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
