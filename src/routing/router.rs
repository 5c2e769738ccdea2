//! Route table.
//!
//! Every route is registered together with the [`Chain`] it runs under;
//! router-wide layers are added last so they wrap every route, including
//! the 404 fallback.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::HeaderName,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::config::GwsConfig;
use crate::http::handlers;
use crate::http::middleware::{csrf, CachePolicy, CsrfProtection};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::Chain;

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn request_span(request: &Request) -> tracing::Span {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id
    )
}

/// Build the router for `config`, with all routes and middleware.
pub fn build_router(config: &GwsConfig, state: AppState) -> Router {
    let cache = Arc::new(CachePolicy::from_config(&config.cache));
    let csrf_state = Arc::new(CsrfProtection::new(config, state.sessions.clone()));
    let static_dir = Path::new(&config.paths.static_dir);

    let pages = Chain::new().compress();
    let assets = Chain::new().compress().cache(cache.clone());
    let favicon = Chain::new().cache(cache);
    let gated = Chain::new().compress().require_auth(state.sessions.clone());

    let routes = Router::new()
        .route("/", get(handlers::home))
        .route_service(
            "/about",
            pages.service(get(handlers::about).with_state::<()>(state.clone())),
        )
        .route_service(
            "/favicon.ico",
            favicon.service(ServeFile::new(static_dir.join("favicon.ico"))),
        )
        .nest_service("/static", assets.service(ServeDir::new(static_dir)))
        .route(
            "/login",
            get(handlers::login_form).post(handlers::login_submit),
        )
        .route("/logout", post(handlers::logout))
        .route_service(
            "/account",
            gated.service(get(handlers::account).with_state::<()>(state.clone())),
        )
        .fallback(handlers::not_found)
        .with_state(state);

    with_server_layers(routes, config, csrf_state)
}

/// Wrap `routes` in the layers every request passes through.
#[allow(deprecated)]
fn with_server_layers(
    routes: Router,
    config: &GwsConfig,
    csrf_state: Arc<CsrfProtection>,
) -> Router {
    // Innermost first: each `layer` call wraps everything added before it.
    routes
        .layer(from_fn_with_state(csrf_state, csrf::csrf_protect))
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
        .layer(RequestBodyTimeoutLayer::new(Duration::from_secs(
            config.timeouts.read_secs,
        )))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.write_secs)))
        .layer(from_fn(metrics::track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
        )
}
