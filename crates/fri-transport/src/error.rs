use std::io::ErrorKind;
use std::net::SocketAddr;

/// Errors that can occur in datagram transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// An I/O error occurred on the socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The datagram does not fit the configured maximum size.
    #[error("datagram too large ({size} bytes, max {max})")]
    DatagramTooLarge { size: usize, max: usize },

    /// A reply was requested before any controller address is known.
    #[error("no controller address known yet")]
    NoPeer,
}

impl TransportError {
    /// True for errors that cost one cycle but leave the socket usable.
    ///
    /// On UDP these are port-unreachable reports from the network stack,
    /// surfaced on a later `send` or `receive` after the controller side was
    /// briefly not listening.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Io(err)
                if matches!(err.kind(), ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset)
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
