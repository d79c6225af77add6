use crate::http::request::{Method, Request};
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    InvalidContentLength,
    /// More bytes are needed before a full request is available
    Incomplete,
}

/// Request head parsed off the front of a buffer.
#[derive(Debug)]
pub struct RequestHead {
    /// Request with an empty body
    pub request: Request,
    /// Bytes taken by the request line, headers and blank separator line
    pub head_len: usize,
    /// Body length announced by `Content-Length`, 0 when absent
    pub content_length: usize,
}

/// Parse one request from the front of `buf`.
///
/// Returns the request and the number of bytes it occupied so the caller can
/// drain them and keep any pipelined remainder.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let RequestHead {
        mut request,
        head_len,
        content_length,
    } = parse_request_head(buf)?;

    let body_bytes = &buf[head_len..];
    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    request.body = body_bytes[..content_length].to_vec();
    Ok((request, head_len + content_length))
}

/// Parse the request line and headers only.
///
/// The body is left in the buffer; `Incomplete` means the blank line ending
/// the head has not arrived yet.
pub fn parse_request_head(buf: &[u8]) -> Result<RequestHead, ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;

    let headers_str =
        std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if parts.next().is_some() || !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| {
            v.parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength)
        })
        .transpose()?
        .unwrap_or(0);

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body: Vec::new(),
    };

    Ok(RequestHead {
        request,
        head_len: headers_end + 4,
        content_length,
    })
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_pipelined_remainder() {
        let req = b"GET /a.html HTTP/1.1\r\nHost: x\r\n\r\nGET /b.css HTTP/1.1\r\n\r\n";

        let (first, consumed) = parse_http_request(req).unwrap();
        assert_eq!(first.path, "/a.html");

        let (second, _) = parse_http_request(&req[consumed..]).unwrap();
        assert_eq!(second.path, "/b.css");
    }

    #[test]
    fn head_parses_without_body_bytes() {
        let req = b"POST /a.html HTTP/1.1\r\nContent-Length: 70000\r\n\r\nxx";

        let head = parse_request_head(req).unwrap();
        assert_eq!(head.request.path, "/a.html");
        assert_eq!(head.head_len, req.len() - 2);
        assert_eq!(head.content_length, 70_000);
        assert!(head.request.body.is_empty());

        assert_eq!(
            parse_http_request(req).unwrap_err(),
            ParseError::Incomplete
        );
    }

    #[test]
    fn parse_rejects_missing_version() {
        let req = b"GET /\r\n\r\n";
        assert_eq!(
            parse_http_request(req).unwrap_err(),
            ParseError::InvalidRequest
        );
    }
}
