//! HTTP response assembly

/// Status lines the server emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    SwitchingProtocols = 101,
    Ok = 200,
    NotFound = 404,
}

impl Status {
    pub fn code(&self) -> u16 {
        *self as u16
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::SwitchingProtocols => "Switching Protocols",
            Self::Ok => "OK",
            Self::NotFound => "Not Found",
        }
    }
}

/// HTTP response builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Append a header, replacing an earlier one with the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| *n != name);
        self.headers.push((name, value.into()));
        self
    }

    /// Set the body together with its `Content-Type` and `Content-Length`
    pub fn body(self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let mut response = self
            .header("Content-Type", content_type)
            .header("Content-Length", body.len().to_string());
        response.body = body;
        response
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Serialise into wire bytes: status line, headers, blank line, body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason()
        )
        .into_bytes();

        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}

// Convenience constructors
impl Response {
    pub fn text(text: &str) -> Self {
        Self::new(Status::Ok).body("text/plain", text)
    }

    pub fn not_found() -> Self {
        Self::new(Status::NotFound).body("text/plain", "404 Not Found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response_wire_format() {
        let wire = Response::text("hi").to_bytes();
        assert_eq!(
            String::from_utf8(wire).unwrap(),
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nhi"
        );
    }

    #[test]
    fn test_not_found_response() {
        let response = Response::not_found();
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(response.body_bytes(), b"404 Not Found");
        assert_eq!(response.header_value("Content-Length"), Some("13"));
        assert!(String::from_utf8(response.to_bytes())
            .unwrap()
            .starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn test_bodyless_response_ends_with_blank_line() {
        let wire = Response::new(Status::SwitchingProtocols)
            .header("Upgrade", "websocket")
            .to_bytes();
        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(text.ends_with("Upgrade: websocket\r\n\r\n"));
    }

    #[test]
    fn test_header_replaced_not_duplicated() {
        let response = Response::new(Status::Ok)
            .header("X-Test", "a")
            .header("X-Test", "b");
        assert_eq!(response.header_value("X-Test"), Some("b"));
        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert_eq!(text.matches("X-Test").count(), 1);
    }
}
