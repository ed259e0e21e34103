use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::checksum::checksum;
use crate::error::{FrameError, Result};

/// Size of the leading payload length field.
pub const LENGTH_SIZE: usize = 4;

/// Size of the trailing checksum field.
pub const CHECKSUM_SIZE: usize = 4;

/// Bytes added around every payload: length (4) + checksum (4).
pub const FRAME_OVERHEAD: usize = LENGTH_SIZE + CHECKSUM_SIZE;

/// Default maximum payload size: a 1500-byte datagram minus framing.
pub const DEFAULT_MAX_PAYLOAD: usize = 1500 - FRAME_OVERHEAD;

/// A verified frame borrowed from a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// The encoded message payload.
    pub payload: &'a [u8],
    /// The checksum carried by the frame (already verified).
    pub checksum: u32,
}

impl Frame<'_> {
    /// The total wire size of this frame (framing + payload).
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }
}

/// Encode a payload into the wire format, appending to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┬──────────────┐
/// │ Length       │ Payload          │ CRC-32       │
/// │ (4B LE)      │ (Length bytes)   │ (4B LE)      │
/// └──────────────┴──────────────────┴──────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(FRAME_OVERHEAD + payload.len());
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    dst.put_u32_le(checksum(payload));
    Ok(())
}

/// Decode one frame occupying the whole of `src`.
///
/// The checksum is verified here, before anything parses the payload.
pub fn decode_frame(src: &[u8], max_payload: usize) -> Result<Frame<'_>> {
    let Some((length, rest)) = src.split_first_chunk::<LENGTH_SIZE>() else {
        return Err(FrameError::Truncated {
            needed: LENGTH_SIZE,
            available: src.len(),
        });
    };
    let declared = u32::from_le_bytes(*length) as usize;

    if declared > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: declared,
            max: max_payload,
        });
    }

    if rest.len() != declared + CHECKSUM_SIZE {
        return Err(FrameError::LengthMismatch {
            declared,
            available: rest.len().saturating_sub(CHECKSUM_SIZE),
        });
    }

    let (payload, trailer) = rest.split_at(declared);
    let declared_checksum = match trailer.first_chunk::<CHECKSUM_SIZE>() {
        Some(bytes) => u32::from_le_bytes(*bytes),
        None => {
            return Err(FrameError::Truncated {
                needed: FRAME_OVERHEAD + declared,
                available: src.len(),
            })
        }
    };

    let computed = checksum(payload);
    if computed != declared_checksum {
        return Err(FrameError::ChecksumMismatch {
            declared: declared_checksum,
            computed,
        });
    }

    trace!(payload_len = declared, "frame verified");
    Ok(Frame {
        payload,
        checksum: declared_checksum,
    })
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 1492.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
