//! HTTP response splitting and chunked-body decoding.
//!
//! The raw response is split on the first blank line into a header block and
//! a body. Header names are case-folded to lowercase for lookup; lines
//! without a colon (the status line first among them) are kept as positional
//! entries, so the status line is always reachable as entry 0.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Parsed response headers.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    /// Lines without a colon, in order; entry 0 is the status line.
    positional: Vec<String>,
    /// Named headers, lowercased.
    named: HashMap<String, String>,
}

impl Headers {
    /// The status line, e.g. `HTTP/1.1 202 Accepted`.
    #[must_use]
    pub fn status_line(&self) -> &str {
        self.positional.first().map_or("", String::as_str)
    }

    /// Numeric status code parsed from the status line.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        let line = self.status_line();
        if !line.starts_with("HTTP/") {
            return None;
        }
        line.split_whitespace().nth(1)?.parse().ok()
    }

    /// Look up a header by its lowercased name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Positional entry by index (0 is the status line).
    #[must_use]
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }
}

/// Splits a raw response into its (de-chunked) body and headers.
///
/// # Errors
///
/// [`Error::MalformedResponse`] when the blank line separating headers from
/// body is missing, or when chunk framing is broken.
pub fn parse(raw: &[u8]) -> Result<(Vec<u8>, Headers)> {
    let split = find_blank_line(raw).ok_or_else(|| {
        Error::MalformedResponse("response has no header/body separator".to_string())
    })?;
    let header_block = String::from_utf8_lossy(&raw[..split]);
    let body = &raw[split + 4..];

    let mut headers = Headers::default();
    for line in header_block.split("\r\n") {
        match line.split_once(':') {
            Some((name, value)) => {
                headers
                    .named
                    .insert(name.to_ascii_lowercase(), value.trim_start().to_string());
            }
            None => headers.positional.push(line.to_string()),
        }
    }

    let body = if headers.get("transfer-encoding") == Some("chunked") {
        dechunk(body)?
    } else {
        body.to_vec()
    };
    Ok((body, headers))
}

/// Offset of the first `\r\n\r\n`.
fn find_blank_line(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Reassembles a chunked body: hex size line (chunk extensions after `;`
/// ignored), that many bytes, a trailing CRLF, terminated by a zero-size
/// chunk. Any framing violation is unrecoverable.
fn dechunk(mut chunked: &[u8]) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let line_end = chunked
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| Error::MalformedResponse("chunk size line not terminated".to_string()))?;
        let size_line = std::str::from_utf8(&chunked[..line_end])
            .map_err(|_| Error::MalformedResponse("chunk size line is not UTF-8".to_string()))?;
        let hex = size_line.split(';').next().unwrap_or(size_line).trim();
        let size = usize::from_str_radix(hex, 16)
            .map_err(|_| Error::MalformedResponse(format!("invalid chunk size '{hex}'")))?;
        chunked = &chunked[line_end + 2..];

        if size == 0 {
            return Ok(body);
        }
        if chunked.len() < size + 2 {
            return Err(Error::MalformedResponse(format!(
                "chunk of {size} bytes truncated"
            )));
        }
        body.extend_from_slice(&chunked[..size]);
        if &chunked[size..size + 2] != b"\r\n" {
            return Err(Error::MalformedResponse(
                "chunk data not followed by CRLF".to_string(),
            ));
        }
        chunked = &chunked[size + 2..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_lowercase_headers() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nX-Request-Id: abc\r\n\r\n{\"type\":\"user\"}";
        let (body, headers) = parse(raw).unwrap();
        assert_eq!(body, b"{\"type\":\"user\"}");
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("x-request-id"), Some("abc"));
        assert_eq!(headers.status_line(), "HTTP/1.1 200 OK");
        assert_eq!(headers.positional(0), Some("HTTP/1.1 200 OK"));
    }

    #[test]
    fn test_status_code_parsing() {
        let raw = b"HTTP/1.1 202 Accepted\r\n\r\n";
        let (_, headers) = parse(raw).unwrap();
        assert_eq!(headers.status_code(), Some(202));

        let raw = b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n";
        let (body, headers) = parse(raw).unwrap();
        assert!(body.is_empty());
        assert_eq!(headers.status_code(), Some(204));
    }

    #[test]
    fn test_dechunks_wikipedia_example() {
        let raw =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let (body, _) = parse(raw).unwrap();
        assert_eq!(body, b"Wikipedia");
    }

    #[test]
    fn test_dechunk_ignores_chunk_extension() {
        let raw =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4;ext=1\r\nWiki\r\n0\r\n\r\n";
        let (body, _) = parse(raw).unwrap();
        assert_eq!(body, b"Wiki");
    }

    #[test]
    fn test_malformed_chunk_framing_fails() {
        // Size line claims more bytes than remain.
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nff\r\nWiki\r\n0\r\n\r\n";
        assert!(matches!(
            parse(raw).unwrap_err(),
            Error::MalformedResponse(_)
        ));

        // Size line is not hex.
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\nWiki\r\n0\r\n\r\n";
        assert!(matches!(
            parse(raw).unwrap_err(),
            Error::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_missing_separator_fails() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n";
        assert!(matches!(
            parse(raw).unwrap_err(),
            Error::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_malformed_header_line_is_positional() {
        let raw = b"HTTP/1.1 200 OK\r\nthis-line-has-no-colon\r\nHost: h\r\n\r\nx";
        let (_, headers) = parse(raw).unwrap();
        assert_eq!(headers.positional(1), Some("this-line-has-no-colon"));
        assert_eq!(headers.get("host"), Some("h"));
    }

    #[test]
    fn test_body_may_contain_crlf_sequences() {
        let raw = b"HTTP/1.1 200 OK\r\n\r\nline1\r\n\r\nline2";
        let (body, _) = parse(raw).unwrap();
        assert_eq!(body, b"line1\r\n\r\nline2");
    }
}
