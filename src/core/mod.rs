//! Core functionality for the multiplexed server

pub mod connection;
pub mod server;

// Re-export main components for convenience
pub use connection::{Connection, ConnectionTable, ReadStatus, Role, LISTENER};
pub use server::{Multiplexer, Server};
