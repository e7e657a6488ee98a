//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Request (Cookie: MuSID=<id>)
//!     → store.rs (find live session or mint a new one)
//!     → handler receives Arc<Session>
//!     → response echoes Set-Cookie when the id changed
//!
//! Expiry:
//!     reaper.rs ticks every reap interval
//!     → store.rs removes sessions older than the TTL
//!     → kill listener notified once per removed session
//! ```
//!
//! # Design Decisions
//! - The store is owned by the server instance, not a process-wide global
//! - Lifetime is absolute (from creation), not sliding
//! - Sessions are kept in memory only

pub mod reaper;
pub mod session;
pub mod store;

pub use reaper::SessionReaper;
pub use session::{Session, SESSION_ID_LEN};
pub use store::{KillListener, KillReason, SessionStore};
