//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper-util auto builder, per-connection task)
//!     → proxy handler → routing (authorize path)
//!         ├─ rejected → response.rs::drop_connection (socket closed, 0 bytes)
//!         └─ accepted → forward.rs (outbound request, streamed body)
//!     → response.rs (relay upstream head + streamed body, or 500/502)
//!     → Send to client
//! ```

pub mod forward;
pub mod response;
pub mod server;

pub use forward::{ForwardError, Forwarder};
pub use server::HttpServer;
