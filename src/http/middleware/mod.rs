//! Per-route and router-wide middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → csrf.rs (every route: session + token check)
//!     → compression.rs (opt-in: gzip the response body)
//!     → cache.rs (opt-in: Cache-Control / Expires)
//!     → auth.rs (opt-in: redirect anonymous users)
//!     → handler
//! ```
//!
//! The opt-in stages are assembled per route by [`crate::routing::Chain`],
//! which always applies them in the order above.

pub mod auth;
pub mod cache;
pub mod compression;
pub mod csrf;

pub use cache::{CacheDirective, CachePolicy};
pub use csrf::{CsrfProtection, CsrfToken};
