use crate::error::Result;

/// One-datagram-in, one-datagram-out transport used by the cycle engine.
///
/// Implementations deliver at most one inbound datagram per call and may
/// lose datagrams; the cycle engine never retries.
pub trait CycleTransport {
    /// Wait for the next inbound datagram and copy it into `buf`.
    ///
    /// Returns `Ok(None)` when no datagram arrived within the transport's
    /// wait budget. The caller treats that as a skipped cycle.
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Send one outbound datagram to the controller.
    fn send(&mut self, datagram: &[u8]) -> Result<()>;
}

impl<T: CycleTransport + ?Sized> CycleTransport for &mut T {
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).receive(buf)
    }

    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        (**self).send(datagram)
    }
}

impl<T: CycleTransport + ?Sized> CycleTransport for Box<T> {
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).receive(buf)
    }

    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        (**self).send(datagram)
    }
}
