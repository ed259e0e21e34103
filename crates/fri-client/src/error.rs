/// Error type returned by application callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in the cycle engine.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] fri_transport::TransportError),

    /// Message decode or encode error.
    #[error("message error: {0}")]
    Message(#[from] fri_message::MessageError),

    /// An application callback failed.
    #[error("{callback} callback failed: {source}")]
    Callback {
        callback: &'static str,
        source: CallbackError,
    },

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
