//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger → accept loop stops → reaper stops → in-flight workers drain
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the stop signal out to every long-running task
//! - Connection workers are never cancelled; they finish their response

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
