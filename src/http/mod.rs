//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted socket (blocking worker)
//!     → request.rs (request line, header block)
//!     → server.rs (session lookup, route dispatch, panic capture)
//!     → [handler reads body, e.g. multipart.rs]
//!     → response.rs (status line, headers, cookies, body)
//!     → socket closed
//! ```
//!
//! # Design Decisions
//! - One request per connection, always `Connection: close`
//! - Every failure is an [`HttpError`] carrying the status it answers with
//! - Parsing works on any `BufRead`, so it is testable without sockets

pub mod error;
pub mod header_value;
pub mod headers;
pub mod method;
pub mod multipart;
pub mod request;
pub mod response;
pub mod server;

pub use error::{HttpError, UNKNOWN_FAILURE_MESSAGE};
pub use header_value::HeaderParams;
pub use method::{Method, Version};
pub use multipart::MultipartEntity;
pub use request::Request;
pub use response::{Body, Cookie, Response, WireOptions};
pub use server::{HttpServer, ServerError};
