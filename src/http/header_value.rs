//! Parameterised header values.
//!
//! `Content-Type`, `Content-Disposition` and `Cookie` share one micro-syntax:
//! `;`-separated segments, each either a bare token or `name=value`, where
//! values may be double-quoted and quoted text may contain `;` and `=`.
//!
//! ```text
//! form-data; name="upload"; filename="a;b=c.txt"
//! └─primary┘ └─name=upload┘ └─filename=a;b=c.txt─┘
//! ```

use std::collections::HashMap;

use crate::http::error::HttpError;

/// Parsed header value: the unnamed primary token plus named parameters.
///
/// Keys are `None` for the primary token and `Some(name)` for parameters,
/// so lookups mirror the raw syntax exactly (names are case-sensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderParams {
    entries: HashMap<Option<String>, String>,
}

impl HeaderParams {
    /// Parse a raw header value.
    ///
    /// A blank value yields an empty mapping. Later duplicates of a name win.
    /// A trailing segment whose quote never closes is ignored.
    pub fn parse(raw: &str) -> Result<Self, HttpError> {
        let mut entries = HashMap::new();
        if raw.trim().is_empty() {
            return Ok(Self { entries });
        }

        let closed = format!("{};", raw);
        let invalid = || HttpError::bad_request(format!("Invalid header value {}", raw));

        let mut segment_start = 0;
        let mut equals_at: Option<usize> = None;
        let mut in_quotes = false;

        for (idx, ch) in closed.char_indices() {
            if ch == '"' {
                in_quotes = !in_quotes;
                continue;
            }
            if in_quotes {
                continue;
            }
            match ch {
                '=' if equals_at.is_none() => equals_at = Some(idx),
                ';' => {
                    match equals_at {
                        None => {
                            let token = clean(&closed[segment_start..idx]);
                            if token.is_empty() {
                                return Err(invalid());
                            }
                            entries.insert(None, token.to_string());
                        }
                        Some(eq) => {
                            let name = clean(&closed[segment_start..eq]);
                            if name.is_empty() {
                                return Err(invalid());
                            }
                            let value = clean(&closed[eq + 1..idx]);
                            entries.insert(Some(name.to_string()), value.to_string());
                        }
                    }
                    segment_start = idx + 1;
                    equals_at = None;
                }
                _ => {}
            }
        }

        // An unclosed quote swallows the closing `;`, so that trailing
        // segment is never emitted; the segments before it still count.
        if in_quotes {
            tracing::debug!(header_value = raw, "Dropped unterminated quoted segment");
        }

        Ok(Self { entries })
    }

    /// The unnamed leading token, e.g. `multipart/form-data`.
    pub fn primary(&self) -> Option<&str> {
        self.entries.get(&None).map(String::as_str)
    }

    /// A named parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&Some(name.to_string()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_deref(), v.as_str()))
    }
}

fn clean(s: &str) -> &str {
    s.trim().trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_with_quoted_filename() {
        let params =
            HeaderParams::parse("form-data; name=\"f\"; filename=\"a b.txt\"").unwrap();
        assert_eq!(params.primary(), Some("form-data"));
        assert_eq!(params.get("name"), Some("f"));
        assert_eq!(params.get("filename"), Some("a b.txt"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn separators_inside_quotes_do_not_split() {
        let params = HeaderParams::parse("x=\"a;b\"").unwrap();
        assert_eq!(params.get("x"), Some("a;b"));
        assert_eq!(params.primary(), None);

        let params = HeaderParams::parse("form-data; filename=\"a;b=c.txt\"").unwrap();
        assert_eq!(params.get("filename"), Some("a;b=c.txt"));
    }

    #[test]
    fn content_type_boundary() {
        let params = HeaderParams::parse("multipart/form-data; boundary=XYZ").unwrap();
        assert_eq!(params.primary(), Some("multipart/form-data"));
        assert_eq!(params.get("boundary"), Some("XYZ"));
    }

    #[test]
    fn cookie_list() {
        let params = HeaderParams::parse("theme=dark; MuSID=abc-123").unwrap();
        assert_eq!(params.get("MuSID"), Some("abc-123"));
        assert_eq!(params.get("theme"), Some("dark"));
        assert_eq!(params.get("musid"), None);
    }

    #[test]
    fn value_keeps_later_equals_signs() {
        let params = HeaderParams::parse("token=YWJj==").unwrap();
        assert_eq!(params.get("token"), Some("YWJj=="));
    }

    #[test]
    fn empty_value_is_allowed() {
        let params = HeaderParams::parse("a=").unwrap();
        assert_eq!(params.get("a"), Some(""));
    }

    #[test]
    fn single_character_tokens() {
        let params = HeaderParams::parse("a; b=c").unwrap();
        assert_eq!(params.primary(), Some("a"));
        assert_eq!(params.get("b"), Some("c"));
    }

    #[test]
    fn blank_input_is_empty() {
        assert!(HeaderParams::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = HeaderParams::parse("=value").unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("=value"));
    }

    #[test]
    fn empty_segment_is_rejected() {
        assert!(HeaderParams::parse("a=1;;b=2").is_err());
    }

    #[test]
    fn unterminated_quote_drops_trailing_segment() {
        assert!(HeaderParams::parse("name=\"open").unwrap().is_empty());

        let params = HeaderParams::parse("a=1; name=\"open").unwrap();
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("name"), None);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn unterminated_quote_hides_later_cookies() {
        let params = HeaderParams::parse("pref=\"dark; MuSID=abc").unwrap();
        assert!(params.is_empty());

        let params = HeaderParams::parse("MuSID=abc; pref=\"dark").unwrap();
        assert_eq!(params.get("MuSID"), Some("abc"));
        assert_eq!(params.get("pref"), None);
    }
}
