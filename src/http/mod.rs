//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown)
//!     → middleware/ (CSRF, then the route's chain)
//!     → handlers.rs (render page or redirect)
//!     → response.rs (security headers, redirects, dates)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::{AppError, AppResult};
pub use request::client_ip;
pub use server::{AppState, HttpServer};
