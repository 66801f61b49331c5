//! Rusty Poll - A single-threaded HTTP/1.1 and WebSocket server implemented in Rust
//!
//! This library multiplexes every connection on one readiness loop,
//! routes HTTP requests through a segment trie and speaks RFC 6455
//! framing on upgraded connections.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod http;
pub mod routing;
pub mod ws;

// Re-export main components
pub use config::ServerConfig;
pub use constants::*;
pub use core::{Multiplexer, Server};
pub use error::{Result, RustyPollError};
pub use handlers::{MessageHandler, Responder, WsResponder};
pub use http::{HttpRequest, Response, Status};
