//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     route table (router.rs)
//!     → per-route Chain (chain.rs) wraps each handler
//!     → router-wide layers (CSRF, metrics, tracing, limits)
//!     → Freeze as immutable axum Router
//!
//! Request:
//!     path lookup → route chain → handler
//!     no match → 404 "Page Not Found"
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Middleware order is fixed by the chain, not by registration order
//! - Path rules use prefix matching only (matcher.rs)

pub mod chain;
pub mod matcher;
pub mod router;

pub use chain::Chain;
pub use router::build_router;
