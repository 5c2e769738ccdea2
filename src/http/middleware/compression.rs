//! Gzip response compression.
//!
//! Requests that do not accept gzip pass straight through. Otherwise the
//! inner response body is streamed through a gzip encoder chunk by chunk, in
//! the order the handler produced it. The encoder writes its trailer when
//! the inner body ends and is dropped with the body on any early exit.
//!
//! Left untouched:
//! - responses that cannot carry a body (1xx, 204, 304)
//! - responses that already declare a `Content-Encoding`
//! - range responses (`Content-Range`)

use std::io;

use async_compression::tokio::bufread::GzipEncoder;
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use futures_util::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};

/// Whether the `Accept-Encoding` headers allow gzip.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|item| {
            let mut params = item.split(';');
            let coding = params.next().unwrap_or_default().trim();
            let named = coding.eq_ignore_ascii_case("gzip")
                || coding.eq_ignore_ascii_case("x-gzip")
                || coding == "*";
            named && !params.any(|p| is_zero_quality(p.trim()))
        })
}

fn is_zero_quality(param: &str) -> bool {
    param
        .strip_prefix("q=")
        .or_else(|| param.strip_prefix("Q="))
        .and_then(|q| q.trim().parse::<f32>().ok())
        .is_some_and(|q| q <= 0.0)
}

fn has_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Compress the response when the client accepts gzip.
pub async fn compress(request: Request, next: Next) -> Response {
    if !accepts_gzip(request.headers()) {
        return next.run(request).await;
    }

    let response = next.run(request).await;
    let headers = response.headers();
    if !has_body(response.status())
        || headers.contains_key(header::CONTENT_ENCODING)
        || headers.contains_key(header::CONTENT_RANGE)
    {
        return response;
    }

    gzip(response)
}

fn gzip(response: Response) -> Response {
    let (mut parts, body) = response.into_parts();
    parts.headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::ACCEPT_RANGES);
    parts.headers.append(header::VARY, HeaderValue::from_static("accept-encoding"));

    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let encoder = GzipEncoder::new(reader);
    Response::from_parts(parts, Body::from_stream(ReaderStream::new(encoder)))
}
