//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → router.rs (scan registered prefixes)
//!     → matcher.rs (prefix test + specificity)
//!     → Return: most specific handler or 404
//!
//! Registration (before the server starts):
//!     set_request_processor(prefix, handler)
//!     → stored by prefix, replacing any earlier entry
//!     → frozen inside Arc<Router> when the server runs
//! ```
//!
//! # Design Decisions
//! - Longest prefix wins; prefixes are unique keys so ties cannot occur
//! - `/` is pre-registered and answers only the exact root path
//! - Deterministic: same path always selects the same handler

pub mod matcher;
pub mod router;

pub use matcher::PathPrefixMatcher;
pub use router::{RequestHandler, RootHandler, Router, ROOT_BODY};
