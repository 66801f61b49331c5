//! HTTP/1.1 request parsing, responses and the WebSocket upgrade

pub mod handshake;
pub mod request;
pub mod response;
pub mod static_files;

pub use handshake::{compute_accept_key, handshake_response};
pub use request::{HttpRequest, ParseError};
pub use response::{Response, Status};
