//! Length-prefixed, checksum-verified datagram framing.
//!
//! Every datagram exchanged with the controller is one frame:
//! - A 4-byte little-endian payload length
//! - The encoded message payload
//! - A 4-byte little-endian CRC-32 of the payload bytes
//!
//! A frame is either fully valid or rejected; no partial payload leaks out.

pub mod checksum;
pub mod codec;
pub mod error;

pub use checksum::checksum;
pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, CHECKSUM_SIZE, DEFAULT_MAX_PAYLOAD,
    FRAME_OVERHEAD, LENGTH_SIZE,
};
pub use error::{FrameError, Result};
