//! Handles through which user code answers requests and messages

pub mod http;
pub mod websocket;

pub use http::Responder;
pub use websocket::{MessageHandler, WsResponder};
