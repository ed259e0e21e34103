/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The datagram is too short to hold the length field.
    #[error("frame truncated ({available} bytes, need at least {needed})")]
    Truncated { needed: usize, available: usize },

    /// The declared payload length does not match the datagram size.
    #[error("frame length mismatch (declared payload {declared} bytes, frame holds {available})")]
    LengthMismatch { declared: usize, available: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The trailing checksum does not match the payload.
    #[error("checksum mismatch (declared {declared:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { declared: u32, computed: u32 },
}

impl FrameError {
    /// True for errors about the frame's length layout rather than its content.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            FrameError::Truncated { .. }
                | FrameError::LengthMismatch { .. }
                | FrameError::PayloadTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
