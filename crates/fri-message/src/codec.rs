use std::marker::PhantomData;

use bytes::BytesMut;
use fri_frame::{decode_frame, encode_frame, FrameConfig, FrameError, FRAME_OVERHEAD};
use prost::Message;
use tracing::debug;

use crate::error::Result;
use crate::joints::JointCount;
use crate::mapper::RepeatedFieldMapper;

/// A message type with a protobuf wire representation.
///
/// Implementors copy between their fixed-capacity local form and the prost
/// wire struct; the codec owns framing, checksums and parse/serialize.
/// Both copies overwrite their target in place so that storage from the
/// previous cycle is reused.
pub trait WireMessage: Sized {
    /// The prost struct the payload parses into.
    type Wire: Message + Default;

    /// Short name used in diagnostics.
    const KIND: &'static str;

    /// A reset message sized for `joint_count` joints.
    fn with_joints(joint_count: JointCount) -> Self;

    /// Return every field to its default and mark every optional group absent.
    fn reset(&mut self);

    /// Copy a parsed wire struct into `self`, overwriting every field. May
    /// leave `self` partially written on error; the decoder resets it.
    fn read_wire(&mut self, wire: &Self::Wire, mapper: &RepeatedFieldMapper) -> Result<()>;

    /// Copy `self` into `wire`, overwriting every field. Absent groups are
    /// set to `None`.
    fn write_wire(&self, wire: &mut Self::Wire, mapper: &RepeatedFieldMapper) -> Result<()>;
}

/// Decodes framed datagrams into a reusable message.
///
/// The decoder owns its output. A successful [`decode`](Self::decode)
/// overwrites all of it; a failed one resets it, so a rejected frame never
/// leaves stale or partial data behind. Once warmed up, decoding a frame
/// without named I/O or transformation entries does not allocate.
pub struct MessageDecoder<M: WireMessage> {
    mapper: RepeatedFieldMapper,
    max_payload: usize,
    wire: M::Wire,
    message: M,
}

impl<M: WireMessage> MessageDecoder<M> {
    pub fn new(joint_count: JointCount) -> Self {
        Self::with_config(joint_count, FrameConfig::default())
    }

    pub fn with_config(joint_count: JointCount, config: FrameConfig) -> Self {
        Self {
            mapper: RepeatedFieldMapper::new(joint_count),
            max_payload: config.max_payload_size,
            wire: M::Wire::default(),
            message: M::with_joints(joint_count),
        }
    }

    pub fn joint_count(&self) -> JointCount {
        self.mapper.count()
    }

    /// Decode one datagram.
    ///
    /// Order of checks: frame layout, checksum, protobuf parse, required
    /// groups and enum ranges, joint-array lengths.
    pub fn decode(&mut self, datagram: &[u8]) -> Result<&M> {
        match self.decode_into(datagram) {
            Ok(()) => {
                debug!(kind = M::KIND, len = datagram.len(), "decoded frame");
                Ok(&self.message)
            }
            Err(err) => {
                self.message.reset();
                debug!(
                    kind = M::KIND,
                    len = datagram.len(),
                    failure = %err.kind(),
                    error = %err,
                    "frame rejected"
                );
                Err(err)
            }
        }
    }

    fn decode_into(&mut self, datagram: &[u8]) -> Result<()> {
        let frame = decode_frame(datagram, self.max_payload)?;
        // Presence comes from the parse.
        self.wire.clear();
        self.wire.merge(frame.payload)?;
        self.message.read_wire(&self.wire, &self.mapper)
    }

    /// The last decoded message; reset if the last decode failed.
    pub fn message(&self) -> &M {
        &self.message
    }
}

/// Encodes messages into framed datagrams using reusable buffers.
///
/// The wire struct is kept between calls and overwritten in place, so
/// steady-state encoding does not allocate.
pub struct MessageEncoder<M: WireMessage> {
    mapper: RepeatedFieldMapper,
    max_payload: usize,
    wire: M::Wire,
    payload: BytesMut,
    frame: BytesMut,
    _message: PhantomData<fn(&M)>,
}

impl<M: WireMessage> MessageEncoder<M> {
    pub fn new(joint_count: JointCount) -> Self {
        Self::with_config(joint_count, FrameConfig::default())
    }

    pub fn with_config(joint_count: JointCount, config: FrameConfig) -> Self {
        let max_payload = config.max_payload_size;
        Self {
            mapper: RepeatedFieldMapper::new(joint_count),
            max_payload,
            wire: M::Wire::default(),
            payload: BytesMut::with_capacity(max_payload),
            frame: BytesMut::with_capacity(max_payload + FRAME_OVERHEAD),
            _message: PhantomData,
        }
    }

    /// Encode one message. The returned frame is valid until the next call.
    pub fn encode(&mut self, message: &M) -> Result<&[u8]> {
        message.write_wire(&mut self.wire, &self.mapper)?;

        self.payload.clear();
        self.wire.encode(&mut self.payload)?;
        if self.payload.len() > self.max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: self.payload.len(),
                max: self.max_payload,
            }
            .into());
        }

        self.frame.clear();
        encode_frame(&self.payload, &mut self.frame)?;
        debug!(kind = M::KIND, len = self.frame.len(), "encoded frame");
        Ok(&self.frame)
    }

    /// The frame produced by the last successful [`encode`](Self::encode).
    pub fn last_frame(&self) -> &[u8] {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandMessage;
    use crate::error::{DecodeFailureKind, MessageError};
    use crate::joints::{CartesianPose, CARTESIAN_POSE_LEN};
    use crate::monitoring::{IpoData, MonitorData, MonitoringMessage, RobotInfo};
    use crate::proto;
    use crate::types::{ConnectionQuality, SessionState};

    fn seven() -> JointCount {
        JointCount::new(7).unwrap()
    }

    fn monitoring(state: SessionState) -> MonitoringMessage {
        let mut message = MonitoringMessage::new(seven());
        message.header.sequence_counter = 9;
        message.connection_info.session_state = state;
        let mut data = MonitorData::new(seven());
        data.measured_joint_position
            .assign(&[0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6])
            .unwrap();
        message.monitor_data = Some(data);
        message
    }

    fn frame_of(wire: &proto::FriMonitoringMessage) -> Vec<u8> {
        let mut frame = BytesMut::new();
        encode_frame(&wire.encode_to_vec(), &mut frame).unwrap();
        frame.to_vec()
    }

    #[test]
    fn monitoring_roundtrip() {
        let mut message = monitoring(SessionState::CommandingActive);
        let mut ipo = IpoData::new(seven());
        ipo.cartesian_pose = Some(CartesianPose([1.5, -2.25, 3.0, 1.0, 0.0, 0.0, 0.0]));
        ipo.redundancy = Some(0.1);
        message.ipo_data = Some(ipo);

        let mut encoder = MessageEncoder::new(seven());
        let mut decoder = MessageDecoder::<MonitoringMessage>::new(seven());
        let frame = encoder.encode(&message).unwrap().to_vec();
        assert_eq!(decoder.decode(&frame).unwrap(), &message);
        assert_eq!(decoder.message(), &message);
    }

    #[test]
    fn command_roundtrip_is_bit_exact() {
        let pose = CartesianPose([
            std::f64::consts::PI,
            -0.0,
            1e-300,
            0.5,
            0.5,
            0.5,
            0.5,
        ]);
        let mut message = CommandMessage::new(seven());
        message.set_cartesian_pose(pose, Some(-0.785));

        let mut encoder = MessageEncoder::new(seven());
        let mut decoder = MessageDecoder::<CommandMessage>::new(seven());
        let frame = encoder.encode(&message).unwrap().to_vec();
        let decoded = decoder.decode(&frame).unwrap();

        let decoded_pose = decoded.data.as_ref().unwrap().cartesian_pose.unwrap();
        for i in 0..CARTESIAN_POSE_LEN {
            assert_eq!(decoded_pose.0[i].to_bits(), pose.0[i].to_bits());
        }
    }

    #[test]
    fn corrupted_payload_is_checksum_failure() {
        let message = monitoring(SessionState::MonitoringReady);
        let mut encoder = MessageEncoder::new(seven());
        let mut frame = encoder.encode(&message).unwrap().to_vec();
        frame[10] ^= 0x40;

        let mut decoder = MessageDecoder::<MonitoringMessage>::new(seven());
        let err = decoder.decode(&frame).unwrap_err();
        assert_eq!(err.kind(), DecodeFailureKind::Checksum);
    }

    fn fully_populated() -> MonitoringMessage {
        let mut message = monitoring(SessionState::CommandingActive);
        message.connection_info.quality = ConnectionQuality::Excellent;
        message.robot_info = Some(RobotInfo::new(seven()));
        let mut ipo = IpoData::new(seven());
        ipo.cartesian_pose = Some(CartesianPose([1.0, 2.0, 3.0, 1.0, 0.0, 0.0, 0.0]));
        message.ipo_data = Some(ipo);
        message
    }

    fn assert_reset(message: &MonitoringMessage) {
        assert_eq!(message.session_state(), SessionState::Idle);
        assert_eq!(message.connection_info.quality, ConnectionQuality::Poor);
        assert!(message.monitor_data.is_none());
        assert!(message.ipo_data.is_none());
        assert!(message.robot_info.is_none());
    }

    #[test]
    fn every_failure_kind_leaves_reset_message() {
        let mut encoder = MessageEncoder::new(seven());
        let mut decoder = MessageDecoder::<MonitoringMessage>::new(seven());
        let good = encoder.encode(&fully_populated()).unwrap().to_vec();

        let truncated = good[..good.len() - 1].to_vec();
        let mut corrupted = good.clone();
        corrupted[10] ^= 0x40;
        let mut oversized = proto::FriMonitoringMessage {
            header: Some(proto::MessageHeader::default()),
            connection_info: Some(proto::ConnectionInfo {
                session_state: SessionState::CommandingActive.into(),
                quality: ConnectionQuality::Excellent.into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        oversized.robot_info = Some(proto::RobotInfo {
            drive_state: proto::WireArray::from_slice(&[1; 8]),
            ..Default::default()
        });
        let oversized = frame_of(&oversized);

        for (bad, kind) in [
            (truncated, DecodeFailureKind::Framing),
            (corrupted, DecodeFailureKind::Checksum),
            (oversized, DecodeFailureKind::Capacity),
        ] {
            let message = decoder.decode(&good).unwrap();
            assert_eq!(message.connection_info.quality, ConnectionQuality::Excellent);
            assert!(message.monitor_data.is_some());
            assert!(message.ipo_data.is_some());
            assert!(message.robot_info.is_some());

            let err = decoder.decode(&bad).unwrap_err();
            assert_eq!(err.kind(), kind);
            assert_reset(decoder.message());
        }
    }

    #[test]
    fn group_absent_after_present_decodes_as_none() {
        let mut encoder = MessageEncoder::new(seven());
        let mut decoder = MessageDecoder::<MonitoringMessage>::new(seven());
        decoder
            .decode(encoder.encode(&fully_populated()).unwrap())
            .unwrap();

        let sparse = monitoring(SessionState::MonitoringReady);
        let message = decoder.decode(encoder.encode(&sparse).unwrap()).unwrap();
        assert_eq!(message, &sparse);
        assert!(message.ipo_data.is_none());
        assert!(message.robot_info.is_none());
    }

    #[test]
    fn excess_joint_values_are_capacity_failure() {
        let mut wire = proto::FriMonitoringMessage {
            header: Some(proto::MessageHeader::default()),
            connection_info: Some(proto::ConnectionInfo::default()),
            ..Default::default()
        };
        wire.monitor_data = Some(proto::MonitorData {
            measured_joint_position: Some(proto::JointValues {
                value: proto::WireArray::from_slice(&[0.0; 8]),
            }),
            ..Default::default()
        });

        let mut decoder = MessageDecoder::<MonitoringMessage>::new(seven());
        let err = decoder.decode(&frame_of(&wire)).unwrap_err();
        assert_eq!(err.kind(), DecodeFailureKind::Capacity);
        assert!(matches!(
            err,
            MessageError::Capacity {
                len: 8,
                capacity: 7,
                ..
            }
        ));
    }

    #[test]
    fn absent_groups_decode_as_none() {
        let wire = proto::FriMonitoringMessage {
            header: Some(proto::MessageHeader {
                message_identifier: 0x245142,
                sequence_counter: 1,
                reflected_sequence_counter: 0,
            }),
            connection_info: Some(proto::ConnectionInfo {
                session_state: SessionState::MonitoringWait.into(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let mut decoder = MessageDecoder::<MonitoringMessage>::new(seven());
        let message = decoder.decode(&frame_of(&wire)).unwrap();
        assert_eq!(message.session_state(), SessionState::MonitoringWait);
        assert!(message.monitor_data.is_none());
        assert!(message.ipo_data.is_none());
        assert!(message.robot_info.is_none());
    }

    #[test]
    fn garbage_payload_with_valid_checksum_is_parse_failure() {
        let mut frame = BytesMut::new();
        encode_frame(&[0xff, 0xff, 0xff], &mut frame).unwrap();

        let mut decoder = MessageDecoder::<MonitoringMessage>::new(seven());
        let err = decoder.decode(&frame).unwrap_err();
        assert_eq!(err.kind(), DecodeFailureKind::Parse);
    }

    #[test]
    fn unknown_session_state_is_parse_failure() {
        let wire = proto::FriMonitoringMessage {
            header: Some(proto::MessageHeader::default()),
            connection_info: Some(proto::ConnectionInfo {
                session_state: 42,
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut decoder = MessageDecoder::<MonitoringMessage>::new(seven());
        let err = decoder.decode(&frame_of(&wire)).unwrap_err();
        assert!(matches!(err, MessageError::UnknownEnumValue { value: 42, .. }));
    }

    #[test]
    fn oversized_payload_is_rejected_on_encode() {
        let mut encoder = MessageEncoder::<MonitoringMessage>::with_config(
            seven(),
            FrameConfig {
                max_payload_size: 16,
            },
        );
        let err = encoder
            .encode(&monitoring(SessionState::MonitoringReady))
            .unwrap_err();
        assert!(matches!(
            err,
            MessageError::Frame(FrameError::PayloadTooLarge { max: 16, .. })
        ));
    }
}
