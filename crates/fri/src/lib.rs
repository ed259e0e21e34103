//! Real-time client for cyclic robot-controller communication.
//!
//! The controller sends one monitoring datagram per cycle and expects one
//! command datagram back within the cycle. fri decodes, tracks the session
//! state and calls into your application at the right moments.
//!
//! # Crate Structure
//!
//! - [`transport`] - Datagram transport (UDP)
//! - [`frame`] - Length-prefixed, CRC-32 checked framing
//! - [`message`] - Monitoring/command messages with fixed-capacity joint arrays
//! - [`client`] - Session state machine, cycle dispatcher and runner (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use fri_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use fri_frame::*;
}

/// Re-export message types.
pub mod message {
    pub use fri_message::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use fri_client::*;
}
