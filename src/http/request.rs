//! HTTP/1.1 request head parsing
//!
//! Only the request line and headers are interpreted. Repeated headers keep
//! the last value; the HTTP version token is not validated.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::str;

use log::debug;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    EmptyRequestLine,
    MissingPath,
    InvalidEncoding,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRequestLine => write!(f, "empty request line"),
            Self::MissingPath => write!(f, "request line has no path"),
            Self::InvalidEncoding => write!(f, "request head is not valid UTF-8"),
        }
    }
}

impl Error for ParseError {}

/// A parsed HTTP request head
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    /// Everything after the first `?` of the request target
    pub query: Option<String>,
    /// Segment bound by a trailing wildcard route, filled in at dispatch
    pub param: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub is_websocket_upgrade: bool,
}

impl HttpRequest {
    /// Parse a request head. `buf` may or may not include the terminating
    /// blank line; anything after it is ignored.
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let head = match find_head_end(buf) {
            Some(end) => &buf[..end],
            None => buf,
        };
        let head = str::from_utf8(head).map_err(|_| ParseError::InvalidEncoding)?;

        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default();
        let mut tokens = request_line.split(' ').filter(|t| !t.is_empty());

        let method = tokens.next().ok_or(ParseError::EmptyRequestLine)?;
        let target = tokens.next().ok_or(ParseError::MissingPath)?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };

        let mut headers = BTreeMap::new();
        for line in lines.filter(|l| !l.is_empty()) {
            match line.split_once(": ") {
                Some((name, value)) => {
                    headers.insert(name.to_string(), value.to_string());
                }
                None => debug!("Ignoring malformed header line: {:?}", line),
            }
        }

        let is_websocket_upgrade = headers.get("Upgrade").map(String::as_str) == Some("websocket")
            && headers.get("Connection").map(String::as_str) == Some("Upgrade")
            && headers
                .get("Sec-WebSocket-Key")
                .is_some_and(|key| !key.is_empty());

        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            query,
            param: None,
            headers,
            is_websocket_upgrade,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Declared body length, zero when absent or unparseable
    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Length of the request head including the blank line, once it is complete
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .map(|pos| pos + HEAD_TERMINATOR.len())
}
