//! `multipart/form-data` body parsing.
//!
//! # Wire format
//! ```text
//! preamble--BOUNDARY\r\n
//! Content-Disposition: form-data; name="a"\r\n
//! \r\n
//! payload\r\n
//! --BOUNDARY\r\n
//! ...
//! --BOUNDARY--
//! ```
//!
//! Parts are read byte by byte until the trailing bytes equal the boundary
//! token; the `\r\n--` delimiter and the token are then cut off the payload.
//! Any end of stream before the closing `--` fails the whole body.

use std::fmt;
use std::io::{BufRead, Read};

use crate::http::error::HttpError;
use crate::http::header_value::HeaderParams;
use crate::http::headers::{self, read_header_block};

/// Length of the `\r\n--` delimiter preceding each boundary token.
const DELIMITER_PREFIX_LEN: usize = 4;

/// One part of a multipart body.
///
/// Equality compares the metadata only; payload bytes are ignored.
#[derive(Clone)]
pub struct MultipartEntity {
    pub content_type: String,
    pub name: Option<String>,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

impl MultipartEntity {
    pub fn new(
        content_type: impl Into<String>,
        name: Option<String>,
        filename: Option<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            name,
            filename,
            data,
        }
    }
}

impl PartialEq for MultipartEntity {
    fn eq(&self, other: &Self) -> bool {
        self.content_type == other.content_type
            && self.name == other.name
            && self.filename == other.filename
    }
}

impl Eq for MultipartEntity {}

impl std::hash::Hash for MultipartEntity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.content_type.hash(state);
        self.name.hash(state);
        self.filename.hash(state);
    }
}

impl fmt::Debug for MultipartEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartEntity")
            .field("content_type", &self.content_type)
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Parse a full multipart body delimited by `boundary`.
pub fn read_multipart<R: BufRead + ?Sized>(
    reader: &mut R,
    boundary: &str,
) -> Result<Vec<MultipartEntity>, HttpError> {
    let boundary = boundary.as_bytes();
    if boundary.is_empty() {
        return Err(HttpError::bad_request("Multipart without 'boundary' value"));
    }

    // Everything up to the first boundary is preamble.
    read_entity(reader, boundary, false)?;

    let mut entities = Vec::new();
    loop {
        let mut marker = [0u8; 2];
        read_exact_or_eof(reader, &mut marker)?;
        match &marker {
            b"--" => break,
            b"\r\n" => entities.push(read_entity(reader, boundary, true)?),
            _ => {
                return Err(HttpError::bad_request(
                    "No new line after boundary in multipart body",
                ))
            }
        }
    }

    tracing::debug!(parts = entities.len(), "Multipart body parsed");
    Ok(entities)
}

fn read_exact_or_eof<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<(), HttpError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => HttpError::bad_request(
            "Unexpected end of stream after boundary in multipart body",
        ),
        _ => HttpError::from(e),
    })
}

/// Read one part: optional headers, then payload up to the next boundary token.
fn read_entity<R: BufRead + ?Sized>(
    reader: &mut R,
    boundary: &[u8],
    with_headers: bool,
) -> Result<MultipartEntity, HttpError> {
    let mut content_type = headers::content_type::OCTET_STREAM.to_string();
    let mut name = None;
    let mut filename = None;

    if with_headers {
        for (header, value) in read_header_block(reader)? {
            match header.as_str() {
                headers::CONTENT_TYPE => content_type = value,
                headers::CONTENT_DISPOSITION => {
                    let params = HeaderParams::parse(&value)?;
                    if params.primary() != Some("form-data") {
                        return Err(HttpError::bad_request(
                            "Content-Disposition must be 'form-data'",
                        ));
                    }
                    name = params.get("name").map(str::to_string);
                    filename = params.get("filename").map(str::to_string);
                }
                _ => {}
            }
        }
    }

    let data = read_until_boundary(reader, boundary)?;
    Ok(MultipartEntity {
        content_type,
        name,
        filename,
        data,
    })
}

/// Collect bytes until the buffer ends with `boundary`, returning the payload
/// without the delimiter and token.
fn read_until_boundary<R: BufRead + ?Sized>(
    reader: &mut R,
    boundary: &[u8],
) -> Result<Vec<u8>, HttpError> {
    let last = boundary[boundary.len() - 1];
    let mut data = Vec::new();

    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Err(HttpError::bad_request(
                "Unexpected end of stream while reading multipart entity body",
            ));
        }

        // Scan the buffered chunk; only a byte equal to the token's last byte
        // can complete a match.
        let mut consumed = 0;
        let mut matched = false;
        for &byte in available {
            consumed += 1;
            data.push(byte);
            if byte == last && data.len() >= boundary.len() && data.ends_with(boundary) {
                matched = true;
                break;
            }
        }
        reader.consume(consumed);

        if matched {
            let size = data
                .len()
                .saturating_sub(boundary.len() + DELIMITER_PREFIX_LEN);
            data.truncate(size);
            return Ok(data);
        }
    }
}
