//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing page:
//!     → headers.rs (fixed security headers before the body)
//!
//! Session cookie / anti-forgery token:
//!     → crypto.rs (AES-GCM cookie sealing, HMAC token signing)
//! ```
//!
//! # Design Decisions
//! - Keys derived once at startup from deployment secrets
//! - Fail closed: tampered input never authenticates

pub mod crypto;
pub mod headers;

pub use crypto::{CookieCrypto, TokenSigner};
pub use headers::SecureHeaders;
