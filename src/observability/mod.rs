//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Connection workers, session store, reaper produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → any tracing subscriber (stdout pretty/JSON in the binary)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Connection id and session id flow through log fields
//! - Metrics are cheap and disabled unless a recorder is installed

pub mod logging;
pub mod metrics;
