//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (GWS_* variables)
//!     → CLI overlay (main.rs)
//!     → missing secrets replaced by per-process random values
//!     → validation.rs (semantic checks)
//!     → GwsConfig (validated, immutable)
//!     → shared to subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Secrets never have a literal default
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::GwsConfig;
pub use schema::ListenerConfig;
pub use schema::CacheConfig;
pub use schema::CacheRuleConfig;
pub use schema::SessionConfig;
pub use schema::Secret;
