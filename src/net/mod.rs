//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, switch to blocking, apply timeouts)
//!     → connection.rs (connection id, state tracking)
//!     → Hand off to a blocking worker in the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Accepting is async, connection handling is blocking on its own worker
//! - Each connection tracked so shutdown can wait for in-flight work

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{Listener, ListenerError};
