use std::error::Error;
use std::fmt;
use std::io;

use crate::http::request::ParseError;
use crate::ws::frame::FrameError;

#[derive(Debug)]
pub enum RustyPollError {
    // Startup errors
    Resolve(String),
    Bind(String),

    // Configuration errors
    ConfigError(String),

    // Routing errors
    InvalidRoute(String),

    // Connection errors
    Io(io::Error),
    MessageTooLarge(usize),

    // Protocol errors
    RequestParse(ParseError),
    Frame(FrameError),
}

impl fmt::Display for RustyPollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(msg) => write!(f, "Address resolution error: {}", msg),
            Self::Bind(msg) => write!(f, "Bind error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::InvalidRoute(msg) => write!(f, "Invalid route: {}", msg),
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::MessageTooLarge(size) => write!(f, "Message too large: {} bytes", size),
            Self::RequestParse(err) => write!(f, "Request parse error: {}", err),
            Self::Frame(err) => write!(f, "Frame error: {}", err),
        }
    }
}

impl Error for RustyPollError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::RequestParse(err) => Some(err),
            Self::Frame(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RustyPollError {
    fn from(err: io::Error) -> Self {
        RustyPollError::Io(err)
    }
}

impl From<ParseError> for RustyPollError {
    fn from(err: ParseError) -> Self {
        RustyPollError::RequestParse(err)
    }
}

impl From<FrameError> for RustyPollError {
    fn from(err: FrameError) -> Self {
        RustyPollError::Frame(err)
    }
}

// Generic result type for RustyPoll
pub type Result<T> = std::result::Result<T, RustyPollError>;
