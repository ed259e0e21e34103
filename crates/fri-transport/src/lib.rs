//! Datagram transport for cyclic robot-controller communication.
//!
//! The controller clocks the session: it sends one datagram per cycle and
//! expects exactly one datagram back. This crate provides the lowest layer:
//! - [`CycleTransport`], the one-in/one-out contract the cycle engine uses
//! - [`UdpTransport`], the UDP socket implementation
//!
//! Everything else builds on top of [`CycleTransport`].

pub mod error;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::CycleTransport;
pub use udp::{UdpConfig, UdpTransport, DEFAULT_PORT, MAX_DATAGRAM_SIZE};
