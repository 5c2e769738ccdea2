//! Request inspection helpers.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::ConnectInfo,
    http::{Extensions, HeaderMap},
};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Best-effort client address for logs.
///
/// The first `X-Forwarded-For` entry wins when it parses; otherwise the
/// peer address recorded by the server is used.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Request};

    #[test]
    fn test_forwarded_for_wins() {
        let mut request = Request::get("/")
            .header(X_FORWARDED_FOR, "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        assert_eq!(client_ip(request.headers(), request.extensions()), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut request = Request::get("/")
            .header(X_FORWARDED_FOR, "not-an-ip")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(request.headers(), request.extensions()), None);

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_ip(request.headers(), request.extensions()), Some("127.0.0.1".parse().unwrap()));
    }
}
