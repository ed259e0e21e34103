use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::CycleTransport;

/// Default UDP port the controller sends to.
pub const DEFAULT_PORT: u16 = 30200;

/// Largest datagram exchanged in either direction.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Configuration for [`UdpTransport`].
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Local address to bind. Default: `0.0.0.0:30200`.
    pub bind_addr: SocketAddr,
    /// Controller address. When `None`, the sender of the first inbound
    /// datagram becomes the controller.
    pub controller_addr: Option<SocketAddr>,
    /// How long `receive` waits before reporting a skipped cycle.
    pub receive_timeout: Option<Duration>,
    /// Maximum outbound datagram size in bytes.
    pub max_datagram_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            controller_addr: None,
            receive_timeout: Some(Duration::from_millis(100)),
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

/// UDP socket transport.
///
/// Replies always go to the controller address, either configured up front
/// or learned from the first datagram received.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    controller: Option<SocketAddr>,
    pinned: bool,
    max_datagram_size: usize,
}

impl UdpTransport {
    /// Bind with default configuration on the given local address.
    pub fn bind(bind_addr: SocketAddr) -> Result<Self> {
        Self::with_config(UdpConfig {
            bind_addr,
            ..UdpConfig::default()
        })
    }

    /// Bind with explicit configuration.
    pub fn with_config(config: UdpConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr).map_err(|e| TransportError::Bind {
            addr: config.bind_addr,
            source: e,
        })?;
        socket.set_read_timeout(config.receive_timeout)?;

        let local = socket.local_addr()?;
        info!(%local, controller = ?config.controller_addr, "udp transport bound");

        Ok(Self {
            socket,
            controller: config.controller_addr,
            pinned: config.controller_addr.is_some(),
            max_datagram_size: config.max_datagram_size,
        })
    }

    /// Local address of the bound socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Into::into)
    }

    /// Controller address replies are sent to, if known.
    pub fn controller_addr(&self) -> Option<SocketAddr> {
        self.controller
    }

    /// Change the receive wait budget.
    pub fn set_receive_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout).map_err(Into::into)
    }
}

impl CycleTransport for UdpTransport {
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        loop {
            let (len, src) = match self.socket.recv_from(buf) {
                Ok(received) => received,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(err) => return Err(TransportError::Io(err)),
            };

            match self.controller {
                Some(expected) if expected != src => {
                    if self.pinned {
                        warn!(%src, %expected, "dropping datagram from unexpected sender");
                        return Ok(None);
                    }
                    info!(old = %expected, new = %src, "controller address changed");
                    self.controller = Some(src);
                }
                Some(_) => {}
                None => {
                    info!(%src, "controller address learned");
                    self.controller = Some(src);
                }
            }

            debug!(len, "datagram received");
            return Ok(Some(len));
        }
    }

    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        if datagram.len() > self.max_datagram_size {
            return Err(TransportError::DatagramTooLarge {
                size: datagram.len(),
                max: self.max_datagram_size,
            });
        }
        let controller = self.controller.ok_or(TransportError::NoPeer)?;

        loop {
            match self.socket.send_to(datagram, controller) {
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
    }

    fn controller_socket() -> UdpSocket {
        let socket = UdpSocket::bind(loopback()).unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        socket
    }

    #[test]
    fn learns_controller_from_first_datagram() {
        let mut transport = UdpTransport::bind(loopback()).unwrap();
        let controller = controller_socket();
        assert!(transport.controller_addr().is_none());

        controller
            .send_to(b"cycle-1", transport.local_addr().unwrap())
            .unwrap();

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let len = transport.receive(&mut buf).unwrap().unwrap();
        assert_eq!(&buf[..len], b"cycle-1");
        assert_eq!(
            transport.controller_addr(),
            Some(controller.local_addr().unwrap())
        );

        transport.send(b"reply-1").unwrap();
        let mut reply = [0u8; 64];
        let (n, _) = controller.recv_from(&mut reply).unwrap();
        assert_eq!(&reply[..n], b"reply-1");
    }

    #[test]
    fn timeout_is_a_skipped_cycle() {
        let mut transport = UdpTransport::with_config(UdpConfig {
            bind_addr: loopback(),
            receive_timeout: Some(Duration::from_millis(10)),
            ..UdpConfig::default()
        })
        .unwrap();

        let mut buf = [0u8; 64];
        assert!(transport.receive(&mut buf).unwrap().is_none());
    }

    #[test]
    fn send_without_controller_fails() {
        let mut transport = UdpTransport::bind(loopback()).unwrap();
        let result = transport.send(b"orphan");
        assert!(matches!(result, Err(TransportError::NoPeer)));
    }

    #[test]
    fn rejects_oversized_datagram() {
        let controller = controller_socket();
        let mut transport = UdpTransport::with_config(UdpConfig {
            bind_addr: loopback(),
            controller_addr: Some(controller.local_addr().unwrap()),
            max_datagram_size: 16,
            ..UdpConfig::default()
        })
        .unwrap();

        let result = transport.send(&[0u8; 17]);
        assert!(matches!(
            result,
            Err(TransportError::DatagramTooLarge { size: 17, max: 16 })
        ));
    }

    #[test]
    fn pinned_controller_ignores_other_senders() {
        let controller = controller_socket();
        let stranger = controller_socket();
        let mut transport = UdpTransport::with_config(UdpConfig {
            bind_addr: loopback(),
            controller_addr: Some(controller.local_addr().unwrap()),
            receive_timeout: Some(Duration::from_secs(2)),
            ..UdpConfig::default()
        })
        .unwrap();
        let target = transport.local_addr().unwrap();

        stranger.send_to(b"spoof", target).unwrap();
        let mut buf = [0u8; 64];
        assert!(transport.receive(&mut buf).unwrap().is_none());

        controller.send_to(b"real", target).unwrap();
        let len = transport.receive(&mut buf).unwrap().unwrap();
        assert_eq!(&buf[..len], b"real");
    }

    #[test]
    fn bind_conflict_reports_address() {
        let first = UdpTransport::bind(loopback()).unwrap();
        let taken = first.local_addr().unwrap();
        let result = UdpTransport::bind(taken);
        assert!(matches!(result, Err(TransportError::Bind { addr, .. }) if addr == taken));
    }
}
