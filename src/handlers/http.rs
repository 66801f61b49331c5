//! Response-writing handle passed to route handlers

use std::path::Path;

use crate::http::response::Response;
use crate::http::static_files::file_response;

/// Queues HTTP responses on the connection a request arrived on.
///
/// Bytes are written to the socket by the server once the handler returns.
pub struct Responder<'a> {
    outbound: &'a mut Vec<u8>,
    responses: usize,
}

impl<'a> Responder<'a> {
    pub(crate) fn new(outbound: &'a mut Vec<u8>) -> Self {
        Self {
            outbound,
            responses: 0,
        }
    }

    pub fn send(&mut self, response: Response) {
        self.outbound.extend_from_slice(&response.to_bytes());
        self.responses += 1;
    }

    /// 200 with a `text/plain` body
    pub fn send_text(&mut self, text: &str) {
        self.send(Response::text(text));
    }

    /// 200 with the file's content, or 404 if it cannot be read
    pub fn send_file(&mut self, path: impl AsRef<Path>) {
        self.send(file_response(path.as_ref()));
    }

    pub fn not_found(&mut self) {
        self.send(Response::not_found());
    }

    pub fn has_responded(&self) -> bool {
        self.responses > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responses_are_queued_in_order() {
        let mut outbound = Vec::new();
        {
            let mut responder = Responder::new(&mut outbound);
            assert!(!responder.has_responded());
            responder.send_text("one");
            responder.not_found();
            assert!(responder.has_responded());
        }

        let text = String::from_utf8(outbound).unwrap();
        let ok = text.find("200 OK").unwrap();
        let missing = text.find("404 Not Found").unwrap();
        assert!(ok < missing);
        assert!(text.contains("\r\n\r\none"));
    }

    #[test]
    fn test_send_file_missing_is_404() {
        let mut outbound = Vec::new();
        Responder::new(&mut outbound).send_file("/definitely/not/here.html");
        assert!(outbound.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
    }
}
