//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Response},
    Router,
};
use gws::config::{GwsConfig, Secret};
use gws::lifecycle::{startup, Shutdown};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

pub const SESSION_SECRET: &str = "integration-session-secret-0123456789";
pub const CSRF_SECRET: &str = "integration-csrf-secret-9876543210abcd";

/// Configuration pointing at the shipped templates and assets.
pub fn test_config() -> GwsConfig {
    let mut config = GwsConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.session.secret = Secret::new(SESSION_SECRET);
    config.session.csrf_secret = Secret::new(CSRF_SECRET);
    config.paths.templates = concat!(env!("CARGO_MANIFEST_DIR"), "/tmpl").into();
    config.paths.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").into();
    config
}

/// The fully layered router, for `oneshot` tests.
pub fn router() -> Router {
    startup::build_server(&test_config())
        .expect("shipped site builds")
        .router()
}

/// Serve the site on an ephemeral port.
pub async fn spawn_server() -> (SocketAddr, Arc<Shutdown>) {
    let config = test_config();
    let server = startup::build_server(&config).expect("shipped site builds");
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Arc::new(Shutdown::new());
    let signalled = shutdown.signalled();
    tokio::spawn(async move {
        server.run(listener, signalled).await.unwrap();
    });
    (addr, shutdown)
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// `name=value` of the first `Set-Cookie`, ready for a `Cookie` header.
pub fn cookie_pair(headers: &HeaderMap) -> String {
    let set_cookie = headers
        .get(header::SET_COOKIE)
        .expect("response sets a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Value of the hidden `csrf_token` input of a rendered form.
pub fn csrf_token(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("page has a CSRF field") + marker.len();
    let len = html[start..].find('"').unwrap();
    html[start..start + len].to_string()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn gunzip(bytes: &[u8]) -> String {
    let mut decoder = async_compression::tokio::bufread::GzipDecoder::new(bytes);
    let mut out = String::new();
    decoder.read_to_string(&mut out).await.unwrap();
    out
}
