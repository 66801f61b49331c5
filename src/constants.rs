// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9034;
pub const DEFAULT_BACKLOG: i32 = 10;
pub const DEFAULT_STATIC_DIR: &str = "../dist";

// Buffer sizing
pub const DEFAULT_MAX_BUF_SIZE: usize = 4096;
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1 << 20;

// Readiness loop
pub const EVENTS_CAPACITY: usize = 1024;

// WebSocket protocol constants (RFC 6455)
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
pub const SMALL_PAYLOAD_SIZE: usize = 125;
pub const MEDIUM_PAYLOAD_SIZE: usize = 0xFFFF;
pub const LARGE_PAYLOAD_SIZE: u64 = 0x7FFF_FFFF_FFFF_FFFF;
pub const PAYLOAD_SIZE_CODE_16BIT: u8 = 126;
pub const PAYLOAD_SIZE_CODE_64BIT: u8 = 127;
// 2 header bytes, 8 extended length bytes, 4 mask bytes
pub const MAX_FRAME_HEADER_SIZE: usize = 14;

// Routing
pub const WILDCARD_SEGMENT: &str = "*";
