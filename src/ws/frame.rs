//! WebSocket frame codec (RFC 6455 section 5.2).
//!
//! Decoding works on whatever bytes a connection has buffered so far and
//! reports [`Decoded::Incomplete`] until a whole frame is present. Frames sent
//! to a client are never masked; frames received from a client always are.

use std::error::Error;
use std::fmt;

use crate::constants::{
    LARGE_PAYLOAD_SIZE, MEDIUM_PAYLOAD_SIZE, PAYLOAD_SIZE_CODE_16BIT, PAYLOAD_SIZE_CODE_64BIT,
    SMALL_PAYLOAD_SIZE,
};

const FIN_BIT: u8 = 0b1000_0000;
const OPCODE_MASK: u8 = 0b0000_1111;
const MASK_BIT: u8 = 0b1000_0000;
const LENGTH_MASK: u8 = 0b0111_1111;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Self::Continuation),
            0x1 => Some(Self::Text),
            0x2 => Some(Self::Binary),
            0x8 => Some(Self::Close),
            0x9 => Some(Self::Ping),
            0xA => Some(Self::Pong),
            _ => None,
        }
    }
}

/// One decoded data frame with its payload already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub mask: Option<[u8; 4]>,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// Outcome of trying to decode the front of a buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    /// A complete data frame and the number of buffer bytes it occupied
    Frame { frame: Frame, consumed: usize },
    /// The peer is closing; nothing after the first two bytes is inspected
    Close,
    /// More bytes are needed before anything can be decided
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    ReservedOpcode(u8),
    Unmasked,
    LengthOutOfRange(u64),
    TooLarge { length: u64, limit: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedOpcode(op) => write!(f, "reserved opcode 0x{:X}", op),
            Self::Unmasked => write!(f, "client frame is not masked"),
            Self::LengthOutOfRange(len) => {
                write!(f, "payload length {} exceeds 2^63 - 1", len)
            }
            Self::TooLarge { length, limit } => {
                write!(f, "payload length {} exceeds limit of {} bytes", length, limit)
            }
        }
    }
}

impl Error for FrameError {}

/// Decode one client frame from the front of `buf`.
///
/// Payloads longer than `max_payload_len` are rejected before any of the
/// payload is examined, so a hostile length field cannot force a large
/// allocation.
pub fn decode(buf: &[u8], max_payload_len: usize) -> Result<Decoded, FrameError> {
    if buf.len() < 2 {
        return Ok(Decoded::Incomplete);
    }

    let fin = buf[0] & FIN_BIT != 0;
    let raw_opcode = buf[0] & OPCODE_MASK;
    let masked = buf[1] & MASK_BIT != 0;
    let length_code = buf[1] & LENGTH_MASK;

    let opcode = Opcode::from_u8(raw_opcode).ok_or(FrameError::ReservedOpcode(raw_opcode))?;
    if opcode == Opcode::Close {
        return Ok(Decoded::Close);
    }

    let (length, mask_offset) = match length_code {
        PAYLOAD_SIZE_CODE_16BIT => {
            let Some(bytes) = buf.get(2..4) else {
                return Ok(Decoded::Incomplete);
            };
            (u64::from(u16::from_be_bytes([bytes[0], bytes[1]])), 4)
        }
        PAYLOAD_SIZE_CODE_64BIT => {
            let Some(bytes) = buf.get(2..10) else {
                return Ok(Decoded::Incomplete);
            };
            let mut be = [0u8; 8];
            be.copy_from_slice(bytes);
            (u64::from_be_bytes(be), 10)
        }
        small => (u64::from(small), 2),
    };

    if length > LARGE_PAYLOAD_SIZE {
        return Err(FrameError::LengthOutOfRange(length));
    }
    let payload_len = match usize::try_from(length) {
        Ok(len) if len <= max_payload_len => len,
        _ => {
            return Err(FrameError::TooLarge {
                length,
                limit: max_payload_len,
            })
        }
    };

    if !masked {
        return Err(FrameError::Unmasked);
    }

    let payload_offset = mask_offset + 4;
    let total = payload_offset + payload_len;
    if buf.len() < total {
        return Ok(Decoded::Incomplete);
    }

    let mut mask = [0u8; 4];
    mask.copy_from_slice(&buf[mask_offset..payload_offset]);

    let mut payload = buf[payload_offset..total].to_vec();
    apply_mask(&mut payload, mask);

    Ok(Decoded::Frame {
        frame: Frame {
            fin,
            opcode,
            mask: Some(mask),
            payload,
        },
        consumed: total,
    })
}

/// XOR `payload` in place with `mask`, cycling through the four key bytes.
/// Applying the same mask twice restores the input.
pub fn apply_mask(payload: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Number of header bytes (before any mask) needed for a payload of `len`.
pub fn header_len(len: usize) -> usize {
    if len <= SMALL_PAYLOAD_SIZE {
        2
    } else if len <= MEDIUM_PAYLOAD_SIZE {
        4
    } else {
        10
    }
}

/// Encode an unmasked, final frame carrying `payload`.
pub fn encode(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let len = payload.len();
    let mut buf = Vec::with_capacity(header_len(len) + len);

    buf.push(FIN_BIT | opcode as u8);

    if len <= SMALL_PAYLOAD_SIZE {
        buf.push(len as u8);
    } else if len <= MEDIUM_PAYLOAD_SIZE {
        buf.push(PAYLOAD_SIZE_CODE_16BIT);
        buf.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        buf.push(PAYLOAD_SIZE_CODE_64BIT);
        buf.extend_from_slice(&(len as u64).to_be_bytes());
    }

    buf.extend_from_slice(payload);
    buf
}

/// Encode a server-to-client text frame.
pub fn encode_text(payload: &[u8]) -> Vec<u8> {
    encode(Opcode::Text, payload)
}

/// The two-byte close frame sent in reply to a client close.
pub fn create_close_frame() -> [u8; 2] {
    [FIN_BIT | Opcode::Close as u8, 0]
}
