//! File-backed responses

use std::fs;
use std::path::Path;

use log::debug;

use crate::http::response::{Response, Status};

/// MIME type for a file name, by extension
pub fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("txt") => "text/plain",
        Some("html") => "text/html",
        Some("svg") => "image/svg+xml",
        Some("wasm") => "application/wasm",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        _ => "application/octet-stream",
    }
}

/// Read `path` into a 200 response, or the 404 response if it cannot be read
pub fn file_response(path: &Path) -> Response {
    match fs::read(path) {
        Ok(content) => Response::new(Status::Ok).body(mime_type(path), content),
        Err(e) => {
            debug!("Cannot serve {}: {}", path.display(), e);
            Response::not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type(Path::new("index.html")), "text/html");
        assert_eq!(mime_type(Path::new("assets/logo.svg")), "image/svg+xml");
        assert_eq!(mime_type(Path::new("pkg/engine.wasm")), "application/wasm");
        assert_eq!(mime_type(Path::new("app.js")), "text/javascript");
        assert_eq!(mime_type(Path::new("style.css")), "text/css");
        assert_eq!(mime_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(mime_type(Path::new("archive")), "application/octet-stream");
    }

    #[test]
    fn test_file_response_reads_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<h1>hi</h1>").unwrap();

        let response = file_response(&path);
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.header_value("Content-Type"), Some("text/html"));
        assert_eq!(response.header_value("Content-Length"), Some("11"));
        assert_eq!(response.body_bytes(), b"<h1>hi</h1>");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let response = file_response(&dir.path().join("missing.js"));
        assert_eq!(response.status(), Status::NotFound);
    }
}
