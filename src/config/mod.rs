//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → flags / env vars (PROXY_KEY, PORT, ...) override file values
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The secret key only leaves `SecretKey` through `expose()`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{Args, ConfigError};
pub use schema::ProxyConfig;
pub use schema::{
    AuthConfig, ListenerConfig, LogFormat, ObservabilityConfig, SecretKey, ShutdownConfig,
    UpstreamConfig,
};
