use std::fmt;

use fri_frame::FrameError;

/// Errors that can occur while decoding or encoding messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Frame-level error (length layout or checksum).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The payload is not valid protobuf for the schema.
    #[error("payload parse error: {0}")]
    Parse(#[from] prost::DecodeError),

    /// A required message group is missing.
    #[error("required field '{0}' missing")]
    MissingField(&'static str),

    /// An enumeration field carries a value outside its range.
    #[error("field '{field}' has unknown value {value}")]
    UnknownEnumValue { field: &'static str, value: i32 },

    /// A repeated field holds more elements than the configured capacity.
    #[error("field '{field}' has {len} elements, capacity is {capacity}")]
    Capacity {
        field: &'static str,
        len: usize,
        capacity: usize,
    },

    /// A repeated field holds fewer elements than the configured joint count.
    #[error("field '{field}' has {len} elements, expected {expected}")]
    Incomplete {
        field: &'static str,
        len: usize,
        expected: usize,
    },

    /// A local value has the wrong number of elements.
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The configured joint count is outside the wire-format capacity.
    #[error("invalid joint count {count} (must be 1..={max})")]
    InvalidJointCount { count: usize, max: usize },

    /// The payload could not be serialized.
    #[error("payload encode error: {0}")]
    Encode(#[from] prost::EncodeError),
}

/// Failure classes for a rejected inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeFailureKind {
    /// Length field unreadable or inconsistent with the datagram size.
    Framing,
    /// Payload does not conform to the schema.
    Parse,
    /// Payload integrity check failed.
    Checksum,
    /// A repeated field exceeds the configured capacity.
    Capacity,
}

impl DecodeFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DecodeFailureKind::Framing => "framing",
            DecodeFailureKind::Parse => "parse",
            DecodeFailureKind::Checksum => "checksum",
            DecodeFailureKind::Capacity => "capacity",
        }
    }
}

impl fmt::Display for DecodeFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MessageError {
    /// Classify this error as a decode failure kind.
    pub fn kind(&self) -> DecodeFailureKind {
        match self {
            MessageError::Frame(FrameError::ChecksumMismatch { .. }) => DecodeFailureKind::Checksum,
            MessageError::Frame(_) => DecodeFailureKind::Framing,
            MessageError::Capacity { .. } => DecodeFailureKind::Capacity,
            _ => DecodeFailureKind::Parse,
        }
    }
}

pub type Result<T> = std::result::Result<T, MessageError>;
