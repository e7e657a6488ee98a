//! Header names, content types and the line-oriented header reader shared by
//! the request parser and the multipart parser.

use std::io::BufRead;

use crate::http::error::HttpError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const COOKIE: &str = "Cookie";
pub const HOST: &str = "Host";
pub const USER_AGENT: &str = "User-Agent";

pub const SERVER: &str = "HTTPServer";
pub const SET_COOKIE: &str = "Set-Cookie";
pub const CONTENT_LENGTH: &str = "Content-Length";
/// Spelling emitted by earlier releases, kept behind a config switch.
pub const LEGACY_CONTENT_LENGTH: &str = "Content-Lenth";
pub const CONNECTION: &str = "Connection";

pub mod content_type {
    pub const PLAIN_TEXT: &str = "text/plain";
    pub const HTML: &str = "text/html";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const JPEG: &str = "image/jpeg";
    pub const PNG: &str = "image/png";
    pub const CSV: &str = "text/csv";
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
}

/// Longest accepted request or header line, terminator included.
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Most header lines accepted in one header block.
pub const MAX_HEADER_COUNT: usize = 100;

/// Read one `\n`-terminated line, dropping the terminator and a trailing `\r`.
///
/// End of stream before the terminator is a 400; a line longer than
/// [`MAX_LINE_LENGTH`] is a 431.
pub fn read_line<R: BufRead + ?Sized>(reader: &mut R) -> Result<String, HttpError> {
    let mut buf = Vec::new();
    let read = std::io::Read::take(&mut *reader, MAX_LINE_LENGTH as u64)
        .read_until(b'\n', &mut buf)?;

    if buf.last() != Some(&b'\n') {
        if read == MAX_LINE_LENGTH {
            return Err(HttpError::header_too_large(format!(
                "Header line exceeds {} bytes",
                MAX_LINE_LENGTH
            )));
        }
        return Err(HttpError::bad_request(
            "Unexpected end of stream while reading header line",
        ));
    }

    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Split `Name: value` at the first colon, trimming both sides.
pub fn split_header_line(line: &str) -> Result<(String, String), HttpError> {
    match line.split_once(':') {
        Some((name, value)) => Ok((name.trim().to_string(), value.trim().to_string())),
        None => Err(HttpError::bad_request(format!("Invalid header line '{}'", line))),
    }
}

/// Read header lines until the blank terminator line.
///
/// Pairs are returned in arrival order; callers decide how duplicates collapse.
pub fn read_header_block<R: BufRead + ?Sized>(
    reader: &mut R,
) -> Result<Vec<(String, String)>, HttpError> {
    let mut headers = Vec::new();
    loop {
        let line = read_line(reader)?;
        if line.is_empty() {
            return Ok(headers);
        }
        if headers.len() == MAX_HEADER_COUNT {
            return Err(HttpError::header_too_large(format!(
                "More than {} header lines",
                MAX_HEADER_COUNT
            )));
        }
        headers.push(split_header_line(&line)?);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_crlf_and_lf_lines() {
        let mut input = Cursor::new(b"first\r\nsecond\nthird\r\n".to_vec());
        assert_eq!(read_line(&mut input).unwrap(), "first");
        assert_eq!(read_line(&mut input).unwrap(), "second");
        assert_eq!(read_line(&mut input).unwrap(), "third");
    }

    #[test]
    fn unterminated_line_is_bad_request() {
        let mut input = Cursor::new(b"no newline".to_vec());
        let err = read_line(&mut input).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn overlong_line_is_rejected() {
        let mut data = vec![b'a'; MAX_LINE_LENGTH + 10];
        data.extend_from_slice(b"\r\n");
        let err = read_line(&mut Cursor::new(data)).unwrap_err();
        assert_eq!(err.status(), 431);
    }

    #[test]
    fn splits_at_first_colon() {
        let (name, value) = split_header_line("Host:  localhost:8080 ").unwrap();
        assert_eq!(name, "Host");
        assert_eq!(value, "localhost:8080");
    }

    #[test]
    fn header_line_without_colon_fails() {
        assert_eq!(split_header_line("garbage").unwrap_err().status(), 400);
    }

    #[test]
    fn header_block_stops_at_blank_line() {
        let mut input = Cursor::new(b"A: 1\r\nB: 2\r\n\r\nbody".to_vec());
        let headers = read_header_block(&mut input).unwrap();
        assert_eq!(
            headers,
            vec![("A".to_string(), "1".to_string()), ("B".to_string(), "2".to_string())]
        );
        let mut rest = String::new();
        std::io::Read::read_to_string(&mut input, &mut rest).unwrap();
        assert_eq!(rest, "body");
    }
}
