//! GWS: a small web server with encrypted cookie sessions.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ CSRF ──▶ route chain ──▶ handler
//!                                               │                  │
//!                                   Compression → Cache → Auth     │
//!                                                                  ▼
//!     Client Response ◀──────────────────────────────── templates + session
//!
//!     Cross-cutting: config, observability, security, lifecycle
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod session;
pub mod templates;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;
