//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Request `Cookie` header
//!     → cookie.rs (find the session cookie)
//!     → store.rs (decrypt, authenticate, check age)
//!     → Session (anonymous on any failure)
//!
//! Mutation (login / logout / refresh):
//!     Session → store.rs (stamp issue time, encrypt)
//!     → cookie.rs (render `Set-Cookie`) → response headers
//! ```
//!
//! # Design Decisions
//! - The cookie is the only persistence; nothing is kept server-side
//! - Fail open to anonymous, never to authenticated
//! - The CSRF middleware reads the session identifier but never the values

pub mod cookie;
pub mod store;

pub use store::{Session, SessionError, SessionStore, USERNAME_KEY};
