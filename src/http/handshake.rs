//! WebSocket opening handshake (RFC 6455 section 4.2.2)

use base64::Engine;
use sha1::{Digest, Sha1};

use crate::constants::WEBSOCKET_GUID;
use crate::http::request::HttpRequest;
use crate::http::response::{Response, Status};

/// Derive the `Sec-WebSocket-Accept` value for a client key.
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    let digest = hasher.finalize();
    base64::engine::general_purpose::STANDARD.encode(digest)
}

/// Build the 101 response accepting `request`'s upgrade. A missing key
/// hashes the GUID alone; callers only get here for requests already
/// flagged as upgrades.
pub fn handshake_response(request: &HttpRequest) -> Response {
    let key = request.header("Sec-WebSocket-Key").unwrap_or_default();

    Response::new(Status::SwitchingProtocols)
        .header("Upgrade", "websocket")
        .header("Connection", "Upgrade")
        .header("Sec-WebSocket-Accept", compute_accept_key(key))
}
