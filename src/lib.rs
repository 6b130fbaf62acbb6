//! Key-gated reverse proxy for bot APIs.
//!
//! Clients call `/bot{key}_{token}/{method}`; the proxy checks `key` against
//! its shared secret and forwards the request to
//! `{upstream}/bot{token}/{method}`. Anything else gets its connection
//! closed without a response.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌────────┐   ┌────────┐   ┌─────────┐   ┌─────────┐
//!     ──────────────────▶│  net   │──▶│  http  │──▶│ routing │──▶│ forward │──▶ Upstream
//!                        │listener│   │ server │   │  (key)  │   │ (hyper) │      API
//!                        └────────┘   └────────┘   └────┬────┘   └────┬────┘
//!                                                       │ rejected    │
//!                                                       ▼             ▼
//!     ◀──────────────────────────────────────── drop (0 bytes)   streamed response
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
