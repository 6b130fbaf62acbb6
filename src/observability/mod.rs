//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (subscriber: filter + pretty/JSON formatter)
//!     → stdout
//! ```
//!
//! # Events
//! - `Invalid key attempt` (warn): attempted key + remote address
//! - `Request forwarded` (info): method, redacted path, upstream status
//! - `Error executing proxy request` (error): construction or upstream failure
//! - `Error copying response body` (error): body failed after the head was sent

pub mod logging;

pub use logging::init_logging;
