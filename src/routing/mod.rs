//! Routing and authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path + query
//!     → matcher.rs (strip /bot, split key token and method suffix)
//!     → router.rs (check provided key, rebuild /bot{token}{suffix}?{query})
//!     → Return: UpstreamTarget or Rejection
//! ```
//!
//! # Design Decisions
//! - Pure and single pass: same input always yields the same result
//! - Rejections carry no information back to the caller; the HTTP layer
//!   answers all of them by dropping the connection

pub mod matcher;
pub mod router;

pub use router::{Rejection, Router, UpstreamTarget};
