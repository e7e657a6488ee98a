//! Outbound responses and their wire serialization.
//!
//! # Wire format
//! ```text
//! HTTP/1.1 <code> <OK|ERROR>\r\n
//! HTTPServer: <server name>\r\n
//! Set-Cookie: <name>=<value>; Max-Age=<secs>[; HttpOnly]\r\n   (zero or more)
//! Content-Length: <n>\r\n
//! Content-Type: <type>\r\n
//! Connection: close\r\n
//! \r\n
//! <body>
//! ```

use std::fmt;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use crate::http::error::HttpError;
use crate::http::headers::{self, content_type};
use crate::session::Session;

/// An outbound `Set-Cookie` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub max_age: Duration,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, max_age: Duration) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age,
            http_only: false,
        }
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Max-Age={}",
            self.name,
            self.value,
            self.max_age.as_secs()
        )?;
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

/// Response body: a reader plus its declared length.
pub struct Body {
    reader: Box<dyn Read + Send>,
    len: u64,
}

impl Body {
    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let len = bytes.len() as u64;
        Self {
            reader: Box::new(Cursor::new(bytes)),
            len,
        }
    }

    pub fn from_reader(reader: impl Read + Send + 'static, len: u64) -> Self {
        Self {
            reader: Box::new(reader),
            len,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Serialization switches taken from configuration.
#[derive(Debug, Clone)]
pub struct WireOptions {
    /// Value of the `HTTPServer` header.
    pub server_name: String,
    /// Emit `Content-Lenth` instead of `Content-Length`.
    pub legacy_content_length_header: bool,
}

impl Default for WireOptions {
    fn default() -> Self {
        Self {
            server_name: "Muzhvay 0.1".to_string(),
            legacy_content_length_header: false,
        }
    }
}

/// A response built by a handler or by error conversion.
///
/// Consumed exactly once by [`Response::write_to`].
pub struct Response {
    status: u16,
    content_type: String,
    body: Body,
    cookies: Vec<Cookie>,
    session: Option<Arc<Session>>,
}

impl Response {
    pub fn new(status: u16, content_type: impl Into<String>, body: Body) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
            cookies: Vec::new(),
            session: None,
        }
    }

    /// 200 with an HTML body.
    pub fn html(text: impl Into<String>) -> Self {
        Self::new(200, content_type::HTML, Body::from_bytes(text.into()))
    }

    /// Plain-text body with the given status.
    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self::new(status, content_type::PLAIN_TEXT, Body::from_bytes(text.into()))
    }

    pub fn bytes(status: u16, content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(status, content_type, Body::from_bytes(bytes))
    }

    /// Streamed body of a known length.
    pub fn stream(
        status: u16,
        content_type: impl Into<String>,
        reader: impl Read + Send + 'static,
        len: u64,
    ) -> Self {
        Self::new(status, content_type, Body::from_reader(reader, len))
    }

    /// Error response: the failure's message as plain text, no session.
    pub fn from_error(err: &HttpError) -> Self {
        Self::text(err.status(), err.to_string())
    }

    /// Attach the session this response belongs to.
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_length(&self) -> u64 {
        self.body.len()
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// Status line and headers, blank line included.
    pub fn head(&self, options: &WireOptions) -> String {
        let reason = if self.status == 200 { "OK" } else { "ERROR" };
        let length_header = if options.legacy_content_length_header {
            headers::LEGACY_CONTENT_LENGTH
        } else {
            headers::CONTENT_LENGTH
        };

        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason);
        head.push_str(&format!("{}: {}\r\n", headers::SERVER, options.server_name));
        for cookie in &self.cookies {
            head.push_str(&format!("{}: {}\r\n", headers::SET_COOKIE, cookie));
        }
        head.push_str(&format!("{}: {}\r\n", length_header, self.body.len()));
        head.push_str(&format!("{}: {}\r\n", headers::CONTENT_TYPE, self.content_type));
        head.push_str(&format!("{}: close\r\n", headers::CONNECTION));
        head.push_str("\r\n");
        head
    }

    /// Write head and body, returning the number of body bytes written.
    pub fn write_to<W: Write + ?Sized>(
        self,
        out: &mut W,
        options: &WireOptions,
    ) -> std::io::Result<u64> {
        out.write_all(self.head(options).as_bytes())?;
        let mut written = 0;
        if self.body.len > 0 {
            let mut body = self.body.reader.take(self.body.len);
            written = std::io::copy(&mut body, out)?;
        }
        out.flush()?;
        Ok(written)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("content_length", &self.body.len())
            .field("cookies", &self.cookies)
            .field("session", &self.session.as_ref().map(|s| s.id()))
            .finish()
    }
}
