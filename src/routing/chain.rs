//! Per-route middleware composition.
//!
//! A [`Chain`] records which optional stages a route wants. Whatever the
//! order of the builder calls, the stages always wrap the handler as
//! Compression → Cache → AuthGate → handler, so an unauthenticated
//! redirect is still compressed and cache-annotated like any other
//! response of that route.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
};
use tower::{util::BoxCloneSyncService, Service, ServiceBuilder};

use crate::http::middleware::{auth, cache, compression, CachePolicy};
use crate::session::SessionStore;

/// Type-erased, fully wrapped route.
pub type RouteService = BoxCloneSyncService<Request, Response, Infallible>;

/// Optional middleware stages of one route.
#[derive(Clone, Default)]
pub struct Chain {
    compress: bool,
    cache: Option<Arc<CachePolicy>>,
    auth: Option<SessionStore>,
}

impl Chain {
    /// A chain with no stages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gzip responses for clients that accept it.
    pub fn compress(mut self) -> Self {
        self.compress = true;
        self
    }

    /// Annotate responses with cache lifetimes from `policy`.
    pub fn cache(mut self, policy: Arc<CachePolicy>) -> Self {
        self.cache = Some(policy);
        self
    }

    /// Redirect anonymous users home.
    pub fn require_auth(mut self, sessions: SessionStore) -> Self {
        self.auth = Some(sessions);
        self
    }

    /// Wrap `terminal` in the configured stages.
    pub fn service<S>(&self, terminal: S) -> RouteService
    where
        S: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse + 'static,
        S::Future: Send + 'static,
    {
        let service = ServiceBuilder::new()
            .option_layer(self.compress.then(|| from_fn(compression::compress)))
            .option_layer(
                self.cache
                    .clone()
                    .map(|policy| from_fn_with_state(policy, cache::apply_cache_policy)),
            )
            .option_layer(
                self.auth
                    .clone()
                    .map(|sessions| from_fn_with_state(sessions, auth::require_login)),
            )
            .map_response(|response: S::Response| response.into_response())
            .service(terminal);

        BoxCloneSyncService::new(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Secret, SessionConfig};
    use crate::http::middleware::CacheDirective;
    use crate::session::{Session, USERNAME_KEY};
    use axum::{
        body::Body,
        http::{header, StatusCode},
        routing::get,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn sessions() -> SessionStore {
        SessionStore::new(&SessionConfig {
            secret: Secret::new("0123456789abcdef0123456789abcdef"),
            ..SessionConfig::default()
        })
    }

    fn policy() -> Arc<CachePolicy> {
        Arc::new(CachePolicy::new(CacheDirective {
            max_age_secs: 60,
            expires_secs: 60,
        }))
    }

    fn gzip_request() -> Request {
        Request::get("/")
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_chain_is_transparent() {
        let service = Chain::new().service(get(|| async { "plain" }));
        let response = service.oneshot(gzip_request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
        assert!(!response.headers().contains_key(header::CACHE_CONTROL));
    }

    #[tokio::test]
    async fn test_auth_redirect_is_compressed_and_cached() {
        // Builder order differs from application order.
        let chain = Chain::new()
            .require_auth(sessions())
            .cache(policy())
            .compress();
        let response = chain
            .service(get(|| async { "secret" }))
            .oneshot(gzip_request())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=60");
    }

    #[tokio::test]
    async fn test_auth_gate_stops_before_handler() {
        let store = sessions();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let service = Chain::new().require_auth(store.clone()).service(get(move || {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
                "secret"
            }
        }));

        let anonymous = service.clone().oneshot(gzip_request()).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::FOUND);
        assert!(!ran.load(Ordering::SeqCst));

        let mut session = Session::new();
        session.insert(USERNAME_KEY, "alice");
        let cookie = format!("{}={}", store.cookie_name(), store.encode(&session).unwrap());
        let request = Request::get("/")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let allowed = service.oneshot(request).await.unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert!(ran.load(Ordering::SeqCst));
    }
}
