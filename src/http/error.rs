//! Failure taxonomy for request handling.
//!
//! Two kinds only: a protocol failure carries the HTTP status it should be
//! answered with, everything else is internal and answered with 500.

use thiserror::Error;

/// Message used when an internal failure carries no text.
pub const UNKNOWN_FAILURE_MESSAGE: &str = "Unknown HTTP processing error";

/// Errors raised while parsing, routing or handling a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// Malformed or unsupported input; answered with `code`.
    #[error("{message}")]
    Protocol { code: u16, message: String },

    /// Anything else (I/O, handler failures, panics).
    #[error("{}", internal_text(.message))]
    Internal { message: String },
}

impl HttpError {
    pub fn protocol(code: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::protocol(400, message)
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::protocol(404, message)
    }

    /// 431 Request Header Fields Too Large.
    pub fn header_too_large(message: impl Into<String>) -> Self {
        Self::protocol(431, message)
    }

    /// 505 HTTP Version Not Supported.
    pub fn unsupported_version(message: impl Into<String>) -> Self {
        Self::protocol(505, message)
    }

    /// Status code the client receives for this failure.
    pub fn status(&self) -> u16 {
        match self {
            Self::Protocol { code, .. } => *code,
            Self::Internal { .. } => 500,
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

fn internal_text(message: &str) -> &str {
    if message.is_empty() {
        UNKNOWN_FAILURE_MESSAGE
    } else {
        message
    }
}

impl From<std::io::Error> for HttpError {
    fn from(e: std::io::Error) -> Self {
        Self::internal(e.to_string())
    }
}
