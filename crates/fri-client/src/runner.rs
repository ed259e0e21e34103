use std::sync::atomic::{AtomicBool, Ordering};

use fri_frame::FRAME_OVERHEAD;
use fri_transport::CycleTransport;
use tracing::{info, trace, warn};

use crate::callbacks::ClientCallbacks;
use crate::config::ClientConfig;
use crate::dispatcher::{CycleDispatcher, CycleOutcome, CycleStats};
use crate::error::Result;

/// Result of one [`CycleRunner::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing arrived within the transport's wait budget. Nothing was sent.
    NoDatagram,
    /// One datagram was dispatched and answered.
    Dispatched(CycleOutcome),
}

/// Drives a [`CycleDispatcher`] from a [`CycleTransport`].
///
/// One step is receive, dispatch, send. Datagrams are handled in arrival
/// order, one per step, each with its own reply.
pub struct CycleRunner<T: CycleTransport, C: ClientCallbacks> {
    transport: T,
    callbacks: C,
    dispatcher: CycleDispatcher,
    buf: Vec<u8>,
}

impl<T: CycleTransport, C: ClientCallbacks> CycleRunner<T, C> {
    pub fn new(transport: T, callbacks: C, config: ClientConfig) -> Result<Self> {
        let buf = vec![0; config.frame.max_payload_size + FRAME_OVERHEAD];
        let dispatcher = CycleDispatcher::new(config)?;
        Ok(Self {
            transport,
            callbacks,
            dispatcher,
            buf,
        })
    }

    /// Run one cycle.
    ///
    /// Transient transport errors ([`TransportError::is_transient`]) are
    /// logged and cost only this cycle; any other transport error is returned.
    ///
    /// [`TransportError::is_transient`]: fri_transport::TransportError::is_transient
    pub fn step(&mut self) -> Result<StepOutcome> {
        let received = match self.transport.receive(&mut self.buf) {
            Err(err) if err.is_transient() => {
                warn!(error = %err, "receive failed, skipping cycle");
                None
            }
            received => received?,
        };
        let Some(len) = received else {
            trace!("no datagram this cycle");
            return Ok(StepOutcome::NoDatagram);
        };
        let report = self
            .dispatcher
            .dispatch(&mut self.callbacks, &self.buf[..len])?;
        let outcome = report.outcome;
        match self.transport.send(report.frame) {
            Err(err) if err.is_transient() => {
                warn!(error = %err, "reply not delivered");
            }
            sent => sent?,
        }
        Ok(StepOutcome::Dispatched(outcome))
    }

    /// Step until `running` is cleared, then return the final counters.
    ///
    /// The flag is checked between cycles, so the loop exits within one
    /// transport wait after it is cleared.
    pub fn run(&mut self, running: &AtomicBool) -> Result<CycleStats> {
        info!(joints = self.dispatcher.joint_count().get(), "cycle loop started");
        while running.load(Ordering::SeqCst) {
            self.step()?;
        }
        let stats = *self.dispatcher.stats();
        info!(
            cycles = stats.cycles,
            commands = stats.commands,
            decode_failures = stats.decode_failures(),
            "cycle loop stopped"
        );
        Ok(stats)
    }

    pub fn dispatcher(&self) -> &CycleDispatcher {
        &self.dispatcher
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_parts(self) -> (T, C) {
        (self.transport, self.callbacks)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use fri_message::{
        CommandMessage, JointCount, MessageDecoder, MessageEncoder, MonitoringMessage,
        SessionState,
    };
    use fri_transport::TransportError;

    use super::*;
    use crate::error::CallbackError;

    #[derive(Default)]
    struct ScriptedTransport {
        inbound: VecDeque<Option<Vec<u8>>>,
        sent: Vec<Vec<u8>>,
    }

    impl CycleTransport for ScriptedTransport {
        fn receive(&mut self, buf: &mut [u8]) -> fri_transport::Result<Option<usize>> {
            match self.inbound.pop_front().flatten() {
                Some(datagram) => {
                    buf[..datagram.len()].copy_from_slice(&datagram);
                    Ok(Some(datagram.len()))
                }
                None => Ok(None),
            }
        }

        fn send(&mut self, datagram: &[u8]) -> fri_transport::Result<()> {
            self.sent.push(datagram.to_vec());
            Ok(())
        }
    }

    /// Fails every receive or send with the given error kind.
    struct Unreachable {
        kind: io::ErrorKind,
        on_receive: bool,
        sent: usize,
    }

    impl CycleTransport for Unreachable {
        fn receive(&mut self, buf: &mut [u8]) -> fri_transport::Result<Option<usize>> {
            if self.on_receive {
                return Err(io::Error::from(self.kind).into());
            }
            let datagram = monitoring(1, SessionState::MonitoringWait);
            buf[..datagram.len()].copy_from_slice(&datagram);
            Ok(Some(datagram.len()))
        }

        fn send(&mut self, _datagram: &[u8]) -> fri_transport::Result<()> {
            self.sent += 1;
            Err(io::Error::from(self.kind).into())
        }
    }

    struct FailingSend;

    impl CycleTransport for FailingSend {
        fn receive(&mut self, buf: &mut [u8]) -> fri_transport::Result<Option<usize>> {
            let datagram = monitoring(1, SessionState::MonitoringWait);
            buf[..datagram.len()].copy_from_slice(&datagram);
            Ok(Some(datagram.len()))
        }

        fn send(&mut self, _datagram: &[u8]) -> fri_transport::Result<()> {
            Err(TransportError::NoPeer)
        }
    }

    struct Hold;

    impl ClientCallbacks for Hold {
        fn on_command(
            &mut self,
            message: &MonitoringMessage,
            command: &mut CommandMessage,
        ) -> std::result::Result<(), CallbackError> {
            if let Some(position) = message.ipo_joint_position() {
                command.set_joint_position(position)?;
            }
            Ok(())
        }
    }

    fn joints() -> JointCount {
        JointCount::new(7).unwrap()
    }

    fn monitoring(sequence: u32, state: SessionState) -> Vec<u8> {
        let mut message = MonitoringMessage::new(joints());
        message.header.sequence_counter = sequence;
        message.connection_info.session_state = state;
        MessageEncoder::new(joints())
            .encode(&message)
            .unwrap()
            .to_vec()
    }

    #[test]
    fn answers_each_datagram_in_order() {
        let transport = ScriptedTransport {
            inbound: VecDeque::from([
                Some(monitoring(1, SessionState::MonitoringWait)),
                None,
                Some(monitoring(2, SessionState::MonitoringReady)),
            ]),
            ..ScriptedTransport::default()
        };
        let mut runner = CycleRunner::new(transport, Hold, ClientConfig::default()).unwrap();

        assert_eq!(
            runner.step().unwrap(),
            StepOutcome::Dispatched(CycleOutcome::Observed)
        );
        assert_eq!(runner.step().unwrap(), StepOutcome::NoDatagram);
        assert_eq!(
            runner.step().unwrap(),
            StepOutcome::Dispatched(CycleOutcome::Observed)
        );

        let (transport, _) = runner.into_parts();
        assert_eq!(transport.sent.len(), 2);

        let mut decoder = MessageDecoder::<CommandMessage>::new(joints());
        let reflected: Vec<u32> = transport
            .sent
            .iter()
            .map(|frame| decoder.decode(frame).unwrap().header.reflected_sequence_counter)
            .collect();
        assert_eq!(reflected, vec![1, 2]);
    }

    #[test]
    fn run_stops_when_flag_cleared() {
        let running = AtomicBool::new(false);
        let mut runner =
            CycleRunner::new(ScriptedTransport::default(), Hold, ClientConfig::default())
                .unwrap();
        let stats = runner.run(&running).unwrap();
        assert_eq!(stats.cycles, 0);
    }

    #[test]
    fn send_failure_is_returned() {
        let mut runner = CycleRunner::new(FailingSend, Hold, ClientConfig::default()).unwrap();
        let err = runner.step().unwrap_err();
        assert!(matches!(
            err,
            crate::ClientError::Transport(TransportError::NoPeer)
        ));
    }

    #[test]
    fn refused_receive_is_a_skipped_cycle() {
        let transport = Unreachable {
            kind: io::ErrorKind::ConnectionRefused,
            on_receive: true,
            sent: 0,
        };
        let mut runner = CycleRunner::new(transport, Hold, ClientConfig::default()).unwrap();
        assert_eq!(runner.step().unwrap(), StepOutcome::NoDatagram);
        assert_eq!(runner.step().unwrap(), StepOutcome::NoDatagram);
        assert_eq!(runner.transport().sent, 0);
        assert_eq!(runner.dispatcher().stats().cycles, 0);
    }

    #[test]
    fn reset_on_send_keeps_the_session() {
        let transport = Unreachable {
            kind: io::ErrorKind::ConnectionReset,
            on_receive: false,
            sent: 0,
        };
        let mut runner = CycleRunner::new(transport, Hold, ClientConfig::default()).unwrap();
        assert_eq!(
            runner.step().unwrap(),
            StepOutcome::Dispatched(CycleOutcome::Observed)
        );
        assert_eq!(
            runner.step().unwrap(),
            StepOutcome::Dispatched(CycleOutcome::Observed)
        );
        assert_eq!(runner.transport().sent, 2);
    }

    #[test]
    fn other_receive_errors_end_the_loop() {
        let transport = Unreachable {
            kind: io::ErrorKind::PermissionDenied,
            on_receive: true,
            sent: 0,
        };
        let mut runner = CycleRunner::new(transport, Hold, ClientConfig::default()).unwrap();
        let running = AtomicBool::new(true);
        let err = runner.run(&running).unwrap_err();
        assert!(matches!(err, crate::ClientError::Transport(TransportError::Io(_))));
    }

    #[test]
    fn invalid_joint_count_is_rejected() {
        let config = ClientConfig {
            joint_count: 0,
            ..ClientConfig::default()
        };
        assert!(CycleRunner::new(ScriptedTransport::default(), Hold, config).is_err());
    }
}
