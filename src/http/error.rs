//! Handler error type.
//!
//! Internal details are logged, never sent: clients get a plain-text
//! `500 Internal Server Error`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::session::SessionError;
use crate::templates::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Session(e) => tracing::error!(error = %e, "Session failure"),
            AppError::Render(e) => tracing::error!(error = %e, "Page render failure"),
        }
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
