//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking, takeover handle)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     Accepted → Serving → {Drained | Aborted} → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Aborting a connection drops the socket; nothing is written

pub mod connection;
pub mod listener;

pub use connection::{ConnectionControl, ConnectionTracker};
pub use listener::{Listener, ListenerError};
