//! Server configuration module
//! Handles the fixed-at-construction parameters of the server

use crate::constants::{
    DEFAULT_BACKLOG, DEFAULT_HOST, DEFAULT_MAX_BUF_SIZE, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT,
    DEFAULT_STATIC_DIR,
};
use crate::error::{Result, RustyPollError};
use std::env;
use std::path::PathBuf;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Accept backlog handed to `listen(2)`
    pub backlog: i32,
    /// Size of a single read from a connection
    pub max_buf_size: usize,
    /// Upper bound on bytes buffered for one connection before a complete
    /// request or frame is available
    pub max_message_size: usize,
    /// Directory the bundled binary serves files from
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            max_buf_size: DEFAULT_MAX_BUF_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("RUSTY_POLL_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env::var("RUSTY_POLL_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let backlog = env::var("RUSTY_POLL_BACKLOG")
            .ok()
            .and_then(|b| b.parse().ok())
            .unwrap_or(DEFAULT_BACKLOG);

        let max_buf_size = env::var("RUSTY_POLL_BUFFER")
            .ok()
            .and_then(|b| b.parse().ok())
            .unwrap_or(DEFAULT_MAX_BUF_SIZE);

        let max_message_size = env::var("RUSTY_POLL_MAX_MESSAGE")
            .ok()
            .and_then(|m| m.parse().ok())
            .unwrap_or(DEFAULT_MAX_MESSAGE_SIZE);

        let static_dir = env::var("RUSTY_POLL_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR));

        let config = Self {
            host,
            port,
            backlog,
            max_buf_size,
            max_message_size,
            static_dir,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    pub fn with_max_buf_size(mut self, max_buf_size: usize) -> Self {
        self.max_buf_size = max_buf_size;
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.static_dir = static_dir.into();
        self
    }

    /// Reject parameter combinations the readiness loop cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_buf_size == 0 {
            return Err(RustyPollError::ConfigError(
                "read buffer size must be greater than zero".to_string(),
            ));
        }

        if self.backlog <= 0 {
            return Err(RustyPollError::ConfigError(format!(
                "accept backlog must be positive, got {}",
                self.backlog
            )));
        }

        if self.max_message_size < self.max_buf_size {
            return Err(RustyPollError::ConfigError(format!(
                "max message size ({}) must not be smaller than the read buffer size ({})",
                self.max_message_size, self.max_buf_size
            )));
        }

        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_buf_size, 4096);
        assert_eq!(config.backlog, 10);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = ServerConfig::default().with_max_buf_size(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("read buffer size"));
    }

    #[test]
    fn test_message_cap_below_buffer_rejected() {
        let config = ServerConfig::default()
            .with_max_buf_size(8192)
            .with_max_message_size(1024);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_backlog_rejected() {
        let config = ServerConfig::default().with_backlog(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_address_formatting() {
        let config = ServerConfig::default().with_host("127.0.0.1").with_port(0);
        assert_eq!(config.address(), "127.0.0.1:0");
    }
}
