//! Request line and header parsing.
//!
//! # Wire format
//! ```text
//! <METHOD> <path> <HTTP-version>\r\n
//! <Name>: <value>\r\n      (zero or more)
//! \r\n
//! ```
//!
//! The body is left unread on the stream; handlers consume it themselves,
//! e.g. through [`Request::read_multipart_body`].

use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;

use crate::http::error::HttpError;
use crate::http::header_value::HeaderParams;
use crate::http::headers::{self, read_header_block, read_line};
use crate::http::method::{Method, Version};
use crate::http::multipart::{self, MultipartEntity};

/// A parsed request head. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    version: Version,
    headers: HashMap<String, String>,
}

impl Request {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        version: Version,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            version,
            headers,
        }
    }

    /// Read a request head from a stream positioned at its first byte.
    pub fn read_from<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self, HttpError> {
        let request_line = read_line(reader)?;
        let parts: Vec<&str> = request_line.split(' ').collect();
        let [method, path, version] = parts.as_slice() else {
            return Err(HttpError::bad_request(format!(
                "Invalid request line '{}'",
                request_line
            )));
        };

        let method: Method = method.parse()?;
        let version: Version = version.parse()?;
        let path = path.to_string();

        // Header names are kept exactly as received; a repeated name keeps its last value.
        let headers = read_header_block(reader)?.into_iter().collect();

        Ok(Self {
            method,
            path,
            version,
            headers,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Raw value of a header, looked up by its exact name.
    pub fn raw_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Parsed value of a header; an absent header yields an empty mapping.
    pub fn header(&self, name: &str) -> Result<HeaderParams, HttpError> {
        match self.raw_header(name) {
            Some(raw) => HeaderParams::parse(raw),
            None => Ok(HeaderParams::default()),
        }
    }

    /// Value of one cookie from the `Cookie` header.
    pub fn cookie(&self, name: &str) -> Result<Option<String>, HttpError> {
        Ok(self.header(headers::COOKIE)?.get(name).map(str::to_string))
    }

    /// Parse the remaining stream as a `multipart/form-data` body.
    ///
    /// Requires a `Content-Type: multipart/form-data; boundary=...` header.
    pub fn read_multipart_body<R: BufRead + ?Sized>(
        &self,
        body: &mut R,
    ) -> Result<Vec<MultipartEntity>, HttpError> {
        let content_type = self.header(headers::CONTENT_TYPE)?;
        if content_type.primary() != Some(headers::content_type::MULTIPART_FORM_DATA) {
            return Err(HttpError::bad_request(
                "Content type must be 'multipart/form-data'",
            ));
        }
        let boundary = content_type
            .get("boundary")
            .filter(|b| !b.is_empty())
            .ok_or_else(|| HttpError::bad_request("Multipart without 'boundary' value"))?;
        multipart::read_multipart(body, boundary)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({} headers)",
            self.method,
            self.path,
            self.version,
            self.headers.len()
        )
    }
}
