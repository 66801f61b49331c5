//! WebSocket framing

pub mod frame;

pub use frame::{create_close_frame, decode, encode_text, Decoded, Frame, FrameError, Opcode};
