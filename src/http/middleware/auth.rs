//! Authentication gate.
//! Anonymous requests are redirected home before the wrapped handler runs.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::response::{redirect_found, HOME_PATH};
use crate::observability::metrics;
use crate::session::SessionStore;

pub async fn require_login(
    State(sessions): State<SessionStore>,
    request: Request,
    next: Next,
) -> Response {
    // Read-only check: the gate itself never re-issues the cookie.
    if sessions.logged_in(request.headers()) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Anonymous request to gated route");
    metrics::record_auth_redirect();
    redirect_found(HOME_PATH)
}
