use serde::Serialize;

use crate::codec::WireMessage;
use crate::error::{MessageError, Result};
use crate::io::{decode_io_list, encode_io_list, IoPayload, IoValue, MAX_IO_VALUES};
use crate::joints::{CartesianPose, JointArray, JointCount, Wrench};
use crate::mapper::{decode_fixed, RepeatedFieldMapper};
use crate::monitoring::{
    joint_values_to_wire, pose_from_wire, pose_to_wire, write_group, MessageHeader,
};
use crate::proto;
use crate::types::IoDirection;

/// Identifier carried in the header of every command message.
pub const COMMAND_MESSAGE_ID: u32 = 0x0003_4001;

/// Command content for one cycle. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandData {
    pub joint_position: Option<JointArray<f64>>,
    pub torque: Option<JointArray<f64>>,
    pub wrench: Option<Wrench>,
    pub cartesian_pose: Option<CartesianPose>,
    pub redundancy: Option<f64>,
    pub write_io: Vec<IoValue>,
}

impl CommandData {
    pub fn is_empty(&self) -> bool {
        self.joint_position.is_none()
            && self.torque.is_none()
            && self.wrench.is_none()
            && self.cartesian_pose.is_none()
            && self.redundancy.is_none()
            && self.write_io.is_empty()
    }
}

/// Client-to-controller reply for one cycle.
///
/// A message without command data is a heartbeat: it keeps the link alive
/// and commands nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandMessage {
    #[serde(skip)]
    joint_count: JointCount,
    pub header: MessageHeader,
    pub data: Option<CommandData>,
}

impl CommandMessage {
    pub fn new(joint_count: JointCount) -> Self {
        Self {
            joint_count,
            header: MessageHeader {
                message_identifier: COMMAND_MESSAGE_ID,
                ..MessageHeader::default()
            },
            data: None,
        }
    }

    pub fn joint_count(&self) -> JointCount {
        self.joint_count
    }

    /// True when no command content is populated.
    pub fn is_heartbeat(&self) -> bool {
        self.data.as_ref().map_or(true, CommandData::is_empty)
    }

    /// Command data, created empty on first use.
    pub fn data_mut(&mut self) -> &mut CommandData {
        self.data.get_or_insert_with(CommandData::default)
    }

    /// Commanded joint positions (radians), one per joint.
    pub fn set_joint_position(&mut self, values: &[f64]) -> Result<()> {
        let array = JointArray::from_slice(self.joint_count, values)?;
        self.data_mut().joint_position = Some(array);
        Ok(())
    }

    /// Commanded Cartesian pose, with an optional redundancy value.
    pub fn set_cartesian_pose(&mut self, pose: CartesianPose, redundancy: Option<f64>) {
        let data = self.data_mut();
        data.cartesian_pose = Some(pose);
        data.redundancy = redundancy;
    }

    /// Commanded joint torques (Nm), one per joint.
    pub fn set_torque(&mut self, values: &[f64]) -> Result<()> {
        let array = JointArray::from_slice(self.joint_count, values)?;
        self.data_mut().torque = Some(array);
        Ok(())
    }

    /// Cartesian wrench feed-forward.
    pub fn set_wrench(&mut self, wrench: Wrench) {
        self.data_mut().wrench = Some(wrench);
    }

    pub fn set_boolean_io(&mut self, name: &str, value: bool) -> Result<()> {
        self.set_io(name, IoPayload::Boolean(value))
    }

    pub fn set_digital_io(&mut self, name: &str, value: u64) -> Result<()> {
        self.set_io(name, IoPayload::Digital(value))
    }

    pub fn set_analog_io(&mut self, name: &str, value: f64) -> Result<()> {
        self.set_io(name, IoPayload::Analog(value))
    }

    // A second write to the same output replaces the first.
    fn set_io(&mut self, name: &str, value: IoPayload) -> Result<()> {
        let write_io = &mut self.data_mut().write_io;
        if let Some(existing) = write_io.iter_mut().find(|io| io.name == name) {
            existing.value = value;
            return Ok(());
        }
        if write_io.len() >= MAX_IO_VALUES {
            return Err(MessageError::Capacity {
                field: "commandData.writeIORequest",
                len: write_io.len() + 1,
                capacity: MAX_IO_VALUES,
            });
        }
        write_io.push(IoValue {
            name: name.to_string(),
            direction: IoDirection::Output,
            value,
        });
        Ok(())
    }
}

impl WireMessage for CommandMessage {
    type Wire = proto::FriCommandMessage;

    const KIND: &'static str = "command";

    fn with_joints(joint_count: JointCount) -> Self {
        Self::new(joint_count)
    }

    fn reset(&mut self) {
        self.header = MessageHeader::default();
        self.data = None;
    }

    fn read_wire(&mut self, wire: &Self::Wire, mapper: &RepeatedFieldMapper) -> Result<()> {
        let header = wire
            .header
            .as_ref()
            .ok_or(MessageError::MissingField("header"))?;
        self.header = MessageHeader::from_wire(header);

        let Some(command) = wire.command_data.as_ref() else {
            self.data = None;
            return Ok(());
        };

        let data = self.data.get_or_insert_with(CommandData::default);
        data.joint_position = command
            .joint_position
            .as_ref()
            .map(|values| mapper.decode_array("commandData.jointPosition", &values.value))
            .transpose()?;
        data.torque = command
            .joint_torque
            .as_ref()
            .map(|values| mapper.decode_array("commandData.jointTorque", &values.value))
            .transpose()?;
        data.wrench = command
            .cartesian_wrench_feed_forward
            .as_ref()
            .map(|wrench| {
                decode_fixed("commandData.cartesianWrenchFeedForward", &wrench.element).map(Wrench)
            })
            .transpose()?;
        data.cartesian_pose = command
            .cartesian_pose
            .as_ref()
            .map(|pose| pose_from_wire("commandData.cartesianPose", pose))
            .transpose()?;
        data.redundancy = command.redundancy;
        decode_io_list(
            "commandData.writeIORequest",
            &command.write_io_request,
            &mut data.write_io,
        )
    }

    fn write_wire(&self, wire: &mut Self::Wire, mapper: &RepeatedFieldMapper) -> Result<()> {
        self.header.write_wire(&mut wire.header);
        write_group(self.data.as_ref(), &mut wire.command_data, |data, wire| {
            write_optional_joints(mapper, data.joint_position.as_ref(), &mut wire.joint_position);
            write_optional_joints(mapper, data.torque.as_ref(), &mut wire.joint_torque);
            write_group(
                data.wrench.as_ref(),
                &mut wire.cartesian_wrench_feed_forward,
                |wrench, wire| {
                    wire.element.clear();
                    wire.element.extend_from_slice(&wrench.0);
                },
            );
            encode_io_list(&data.write_io, &mut wire.write_io_request);
            pose_to_wire(data.cartesian_pose.as_ref(), &mut wire.cartesian_pose);
            wire.redundancy = data.redundancy;
        });
        Ok(())
    }
}

fn write_optional_joints(
    mapper: &RepeatedFieldMapper,
    local: Option<&JointArray<f64>>,
    wire: &mut Option<proto::JointValues>,
) {
    match local {
        Some(local) => joint_values_to_wire(mapper, local, wire),
        None => *wire = None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count() -> JointCount {
        JointCount::new(7).unwrap()
    }

    #[test]
    fn new_message_is_heartbeat() {
        let message = CommandMessage::new(count());
        assert!(message.is_heartbeat());
        assert_eq!(message.header.message_identifier, COMMAND_MESSAGE_ID);
    }

    #[test]
    fn joint_position_needs_exact_count() {
        let mut message = CommandMessage::new(count());
        assert!(matches!(
            message.set_joint_position(&[0.0; 6]),
            Err(MessageError::LengthMismatch {
                expected: 7,
                actual: 6
            })
        ));
        assert!(message.is_heartbeat());

        message.set_joint_position(&[0.5; 7]).unwrap();
        assert!(!message.is_heartbeat());
    }

    #[test]
    fn io_writes_replace_by_name_and_respect_capacity() {
        let mut message = CommandMessage::new(count());
        message.set_boolean_io("Gripper", true).unwrap();
        message.set_boolean_io("Gripper", false).unwrap();
        assert_eq!(message.data.as_ref().unwrap().write_io.len(), 1);
        assert_eq!(
            message.data.as_ref().unwrap().write_io[0].value,
            IoPayload::Boolean(false)
        );

        for i in 1..MAX_IO_VALUES {
            message.set_analog_io(&format!("Out{i}"), 0.1).unwrap();
        }
        let err = message.set_digital_io("OneTooMany", 1).unwrap_err();
        assert!(matches!(err, MessageError::Capacity { capacity: 10, .. }));
    }

    #[test]
    fn wire_roundtrip_keeps_every_field() {
        let mut message = CommandMessage::new(count());
        message.header.sequence_counter = 3;
        message.header.reflected_sequence_counter = 41;
        message
            .set_joint_position(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7])
            .unwrap();
        message.set_torque(&[1.0; 7]).unwrap();
        message.set_wrench(Wrench([1.0, 2.0, 3.0, 0.1, 0.2, 0.3]));
        message.set_cartesian_pose(
            CartesianPose([500.0, 10.0, 300.0, 0.0, 1.0, 0.0, 0.0]),
            Some(0.25),
        );
        message.set_analog_io("AnalogOut1", 0.75).unwrap();

        let mapper = RepeatedFieldMapper::new(count());
        let mut wire = proto::FriCommandMessage::default();
        message.write_wire(&mut wire, &mapper).unwrap();

        let mut decoded = CommandMessage::new(count());
        decoded.read_wire(&wire, &mapper).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn heartbeat_has_no_command_data_on_wire() {
        let message = CommandMessage::new(count());
        let mut wire = proto::FriCommandMessage::default();
        message
            .write_wire(&mut wire, &RepeatedFieldMapper::new(count()))
            .unwrap();
        assert!(wire.header.is_some());
        assert!(wire.command_data.is_none());
    }
}
