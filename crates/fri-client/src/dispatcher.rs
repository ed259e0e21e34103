use fri_message::{
    CommandMessage, DecodeFailureKind, JointCount, MessageDecoder, MessageEncoder, MessageHeader,
    MonitoringMessage, SessionState, WireMessage, COMMAND_MESSAGE_ID,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::callbacks::ClientCallbacks;
use crate::config::ClientConfig;
use crate::error::{CallbackError, ClientError, Result};
use crate::session::{SessionStateMachine, Transition};

/// What happened in one dispatched cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The datagram failed to decode; a heartbeat was sent.
    Rejected(DecodeFailureKind),
    /// Decoded, session is `IDLE`; no callbacks besides a state change.
    Idle,
    /// Monitoring callback ran; a heartbeat was sent.
    Observed,
    /// Command callback ran in `COMMANDING_ACTIVE`.
    Commanded,
    /// A callback returned an error; a heartbeat was sent.
    CallbackFailed,
}

/// Result of [`CycleDispatcher::dispatch`].
#[derive(Debug)]
pub struct CycleReport<'a> {
    pub outcome: CycleOutcome,
    /// Session state after the cycle.
    pub state: SessionState,
    /// The transition observed this cycle, if any.
    pub transition: Option<Transition>,
    /// Encoded command frame to hand to the transport.
    pub frame: &'a [u8],
}

/// Running counters kept by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub framing_failures: u64,
    pub parse_failures: u64,
    pub checksum_failures: u64,
    pub capacity_failures: u64,
    pub callback_failures: u64,
    pub sequence_gaps: u64,
    pub commands: u64,
    pub heartbeats: u64,
}

impl CycleStats {
    /// Total rejected datagrams, all kinds.
    pub fn decode_failures(&self) -> u64 {
        self.framing_failures
            + self.parse_failures
            + self.checksum_failures
            + self.capacity_failures
    }

    fn record_failure(&mut self, kind: DecodeFailureKind) {
        match kind {
            DecodeFailureKind::Framing => self.framing_failures += 1,
            DecodeFailureKind::Parse => self.parse_failures += 1,
            DecodeFailureKind::Checksum => self.checksum_failures += 1,
            DecodeFailureKind::Capacity => self.capacity_failures += 1,
        }
    }
}

/// Runs one protocol cycle per inbound datagram.
///
/// Owns the decoder, the session state, the outbound command and the
/// encoder. Every call to [`dispatch`](Self::dispatch) produces exactly one
/// outbound frame, even when decoding or a callback fails.
pub struct CycleDispatcher {
    decoder: MessageDecoder<MonitoringMessage>,
    encoder: MessageEncoder<CommandMessage>,
    session: SessionStateMachine,
    command: CommandMessage,
    sequence_counter: u32,
    reflected_sequence_counter: u32,
    last_sequence: Option<u32>,
    stats: CycleStats,
}

impl CycleDispatcher {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let joint_count = config.joint_count()?;
        Ok(Self {
            decoder: MessageDecoder::with_config(joint_count, config.frame.clone()),
            encoder: MessageEncoder::with_config(joint_count, config.frame),
            session: SessionStateMachine::new(),
            command: CommandMessage::new(joint_count),
            sequence_counter: 0,
            reflected_sequence_counter: 0,
            last_sequence: None,
            stats: CycleStats::default(),
        })
    }

    pub fn joint_count(&self) -> JointCount {
        self.decoder.joint_count()
    }

    /// Current session state. Read-only for applications.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// The monitoring message of the last cycle; reset if that cycle's
    /// datagram was rejected.
    pub fn last_monitoring(&self) -> &MonitoringMessage {
        self.decoder.message()
    }

    /// Decode `datagram`, update the session, run the callbacks and encode
    /// the reply.
    ///
    /// Decode and callback failures are absorbed: they are logged, counted
    /// and answered with a heartbeat. Only an encoding failure of the
    /// heartbeat itself is returned as an error.
    pub fn dispatch<C: ClientCallbacks + ?Sized>(
        &mut self,
        callbacks: &mut C,
        datagram: &[u8],
    ) -> Result<CycleReport<'_>> {
        self.stats.cycles += 1;
        self.command.reset();

        let decoded = self.decoder.decode(datagram).map(|_| ());
        let (outcome, transition) = match decoded {
            Err(err) => {
                let kind = err.kind();
                self.stats.record_failure(kind);
                warn!(
                    failure = %kind,
                    error = %err,
                    state = %self.session.state(),
                    "monitoring frame rejected, sending heartbeat"
                );
                (CycleOutcome::Rejected(kind), None)
            }
            Ok(()) => {
                let message = self.decoder.message();
                let sequence = message.header.sequence_counter;
                if let Some(previous) = self.last_sequence {
                    if sequence != previous.wrapping_add(1) {
                        self.stats.sequence_gaps += 1;
                        debug!(previous, sequence, "sequence gap");
                    }
                }
                self.last_sequence = Some(sequence);
                self.reflected_sequence_counter = sequence;

                let mut failed = false;
                let transition = self.session.observe(message.session_state(), |t| {
                    if let Err(source) = callbacks.on_state_change(t.old, t.new) {
                        callback_failed("on_state_change", source);
                        failed = true;
                    }
                });

                // A failed state-change callback still observes; it only
                // suppresses the command.
                let state = self.session.state();
                if state.is_monitoring() || state.is_commanding() {
                    if let Err(source) = callbacks.on_monitor(message) {
                        callback_failed("on_monitor", source);
                        failed = true;
                    }
                }
                if !failed && state.is_commanding_active() {
                    if let Err(source) = callbacks.on_command(message, &mut self.command) {
                        callback_failed("on_command", source);
                        failed = true;
                    }
                }

                let outcome = if failed {
                    self.stats.callback_failures += 1;
                    self.command.reset();
                    CycleOutcome::CallbackFailed
                } else if state.is_commanding_active() {
                    CycleOutcome::Commanded
                } else if state == SessionState::Idle {
                    CycleOutcome::Idle
                } else {
                    CycleOutcome::Observed
                };
                (outcome, transition)
            }
        };

        self.encode_reply()?;
        Ok(CycleReport {
            outcome,
            state: self.session.state(),
            transition,
            frame: self.encoder.last_frame(),
        })
    }

    fn encode_reply(&mut self) -> Result<()> {
        self.stamp_header();
        if let Err(err) = self.encoder.encode(&self.command).map(|_| ()) {
            if self.command.is_heartbeat() {
                return Err(err.into());
            }
            warn!(error = %err, "command could not be encoded, sending heartbeat");
            self.command.reset();
            self.stamp_header();
            self.encoder.encode(&self.command)?;
        }

        if self.command.is_heartbeat() {
            self.stats.heartbeats += 1;
        } else {
            self.stats.commands += 1;
        }
        self.sequence_counter = self.sequence_counter.wrapping_add(1);
        Ok(())
    }

    fn stamp_header(&mut self) {
        self.command.header = MessageHeader {
            message_identifier: COMMAND_MESSAGE_ID,
            sequence_counter: self.sequence_counter,
            reflected_sequence_counter: self.reflected_sequence_counter,
        };
    }
}

fn callback_failed(callback: &'static str, source: CallbackError) {
    let err = ClientError::Callback { callback, source };
    warn!(callback, error = %err, "callback failed, sending heartbeat");
}
