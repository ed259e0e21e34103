use std::time::Duration;

use serde::Serialize;

use crate::codec::WireMessage;
use crate::error::{MessageError, Result};
use crate::io::{decode_io_list, encode_io_list, IoValue};
use crate::joints::{CartesianPose, JointArray, JointCount, Timestamp, MAX_JOINTS};
use crate::mapper::{decode_fixed, RepeatedFieldMapper};
use crate::proto::{self, WireArray};
use crate::types::{
    enum_from_wire, ClientCommandMode, ConnectionQuality, ControlMode, DriveState, OperationMode,
    OverlayType, SafetyState, SessionState,
};

/// Identifier carried in the header of every monitoring message.
pub const MONITORING_MESSAGE_ID: u32 = 0x0024_5142;

/// Maximum requested coordinate transformations per message.
pub const MAX_TRANSFORMATIONS: usize = 5;

/// Message header shared by both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MessageHeader {
    pub message_identifier: u32,
    pub sequence_counter: u32,
    pub reflected_sequence_counter: u32,
}

impl MessageHeader {
    pub(crate) fn from_wire(wire: &proto::MessageHeader) -> Self {
        Self {
            message_identifier: wire.message_identifier,
            sequence_counter: wire.sequence_counter,
            reflected_sequence_counter: wire.reflected_sequence_counter,
        }
    }

    pub(crate) fn write_wire(self, wire: &mut Option<proto::MessageHeader>) {
        let wire = wire.get_or_insert_with(Default::default);
        wire.message_identifier = self.message_identifier;
        wire.sequence_counter = self.sequence_counter;
        wire.reflected_sequence_counter = self.reflected_sequence_counter;
    }
}

/// Session state and link quality. Always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConnectionInfo {
    pub session_state: SessionState,
    pub quality: ConnectionQuality,
    /// Controller send period in milliseconds.
    pub send_period_ms: Option<u32>,
    /// Number of controller periods per client reply.
    pub receive_multiplier: Option<u32>,
}

/// Static robot description and per-axis drive states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotInfo {
    pub number_of_joints: Option<u32>,
    pub drive_state: JointArray<DriveState>,
    pub safety_state: SafetyState,
    pub operation_mode: OperationMode,
    pub control_mode: ControlMode,
}

impl RobotInfo {
    pub fn new(count: JointCount) -> Self {
        Self {
            number_of_joints: Some(count.get() as u32),
            drive_state: JointArray::new(count),
            safety_state: SafetyState::default(),
            operation_mode: OperationMode::default(),
            control_mode: ControlMode::default(),
        }
    }

    fn read_wire(&mut self, wire: &proto::RobotInfo, mapper: &RepeatedFieldMapper) -> Result<()> {
        let raw = mapper.decode_array("robotInfo.driveState", &wire.drive_state)?;
        for (local, &value) in self.drive_state.iter_mut().zip(raw.iter()) {
            *local = enum_from_wire("robotInfo.driveState", value)?;
        }
        self.number_of_joints = wire.number_of_joints;
        self.safety_state = enum_from_wire("robotInfo.safetyState", wire.safety_state)?;
        self.operation_mode = enum_from_wire("robotInfo.operationMode", wire.operation_mode)?;
        self.control_mode = enum_from_wire("robotInfo.controlMode", wire.control_mode)?;
        Ok(())
    }

    fn write_wire(&self, wire: &mut proto::RobotInfo, mapper: &RepeatedFieldMapper) {
        let mut raw = JointArray::<i32>::new(mapper.count());
        for (local, &state) in raw.iter_mut().zip(self.drive_state.iter()) {
            *local = state.into();
        }
        mapper.bind_encode(&raw, &mut wire.drive_state);
        wire.number_of_joints = self.number_of_joints;
        wire.safety_state = self.safety_state.into();
        wire.operation_mode = self.operation_mode.into();
        wire.control_mode = self.control_mode.into();
    }
}

/// Measured robot data of the current cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorData {
    pub measured_joint_position: JointArray<f64>,
    pub measured_torque: JointArray<f64>,
    pub commanded_torque: JointArray<f64>,
    pub external_torque: JointArray<f64>,
    pub measured_cartesian_pose: Option<CartesianPose>,
    pub measured_redundancy: Option<f64>,
    pub read_io: Vec<IoValue>,
    pub timestamp: Option<Timestamp>,
}

impl MonitorData {
    pub fn new(count: JointCount) -> Self {
        Self {
            measured_joint_position: JointArray::new(count),
            measured_torque: JointArray::new(count),
            commanded_torque: JointArray::new(count),
            external_torque: JointArray::new(count),
            measured_cartesian_pose: None,
            measured_redundancy: None,
            read_io: Vec::new(),
            timestamp: None,
        }
    }

    fn read_wire(
        &mut self,
        wire: &proto::MonitorData,
        mapper: &RepeatedFieldMapper,
    ) -> Result<()> {
        bind_joint_values(
            mapper,
            "monitorData.measuredJointPosition",
            &wire.measured_joint_position,
            &mut self.measured_joint_position,
        )?;
        bind_joint_values(
            mapper,
            "monitorData.measuredTorque",
            &wire.measured_torque,
            &mut self.measured_torque,
        )?;
        bind_joint_values(
            mapper,
            "monitorData.commandedTorque",
            &wire.commanded_torque,
            &mut self.commanded_torque,
        )?;
        bind_joint_values(
            mapper,
            "monitorData.externalTorque",
            &wire.external_torque,
            &mut self.external_torque,
        )?;
        self.measured_cartesian_pose = wire
            .measured_cartesian_pose
            .as_ref()
            .map(|pose| pose_from_wire("monitorData.measuredCartesianPose", pose))
            .transpose()?;
        self.measured_redundancy = wire.measured_redundancy;
        decode_io_list("monitorData.readIORequest", &wire.read_io_request, &mut self.read_io)?;
        self.timestamp = wire.timestamp.as_ref().map(|ts| Timestamp {
            sec: ts.sec,
            nanosec: ts.nanosec,
        });
        Ok(())
    }

    fn write_wire(&self, wire: &mut proto::MonitorData, mapper: &RepeatedFieldMapper) {
        joint_values_to_wire(
            mapper,
            &self.measured_joint_position,
            &mut wire.measured_joint_position,
        );
        joint_values_to_wire(mapper, &self.measured_torque, &mut wire.measured_torque);
        joint_values_to_wire(mapper, &self.commanded_torque, &mut wire.commanded_torque);
        joint_values_to_wire(mapper, &self.external_torque, &mut wire.external_torque);
        encode_io_list(&self.read_io, &mut wire.read_io_request);
        pose_to_wire(self.measured_cartesian_pose.as_ref(), &mut wire.measured_cartesian_pose);
        wire.measured_redundancy = self.measured_redundancy;
        wire.timestamp = self.timestamp.map(|ts| proto::TimeStamp {
            sec: ts.sec,
            nanosec: ts.nanosec,
        });
    }
}

/// The controller's interpolated target, present while commanding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpoData {
    pub joint_position: JointArray<f64>,
    pub cartesian_pose: Option<CartesianPose>,
    pub redundancy: Option<f64>,
    pub client_command_mode: ClientCommandMode,
    pub overlay_type: OverlayType,
    pub tracking_performance: Option<f64>,
}

impl IpoData {
    pub fn new(count: JointCount) -> Self {
        Self {
            joint_position: JointArray::new(count),
            cartesian_pose: None,
            redundancy: None,
            client_command_mode: ClientCommandMode::default(),
            overlay_type: OverlayType::default(),
            tracking_performance: None,
        }
    }

    fn read_wire(&mut self, wire: &proto::IpoData, mapper: &RepeatedFieldMapper) -> Result<()> {
        bind_joint_values(
            mapper,
            "ipoData.jointPosition",
            &wire.joint_position,
            &mut self.joint_position,
        )?;
        self.cartesian_pose = wire
            .cartesian_pose
            .as_ref()
            .map(|pose| pose_from_wire("ipoData.cartesianPose", pose))
            .transpose()?;
        self.redundancy = wire.redundancy;
        self.client_command_mode =
            enum_from_wire("ipoData.clientCommandMode", wire.client_command_mode)?;
        self.overlay_type = enum_from_wire("ipoData.overlayType", wire.overlay_type)?;
        self.tracking_performance = wire.tracking_performance;
        Ok(())
    }

    fn write_wire(&self, wire: &mut proto::IpoData, mapper: &RepeatedFieldMapper) {
        joint_values_to_wire(mapper, &self.joint_position, &mut wire.joint_position);
        pose_to_wire(self.cartesian_pose.as_ref(), &mut wire.cartesian_pose);
        wire.redundancy = self.redundancy;
        wire.client_command_mode = self.client_command_mode.into();
        wire.overlay_type = self.overlay_type.into();
        wire.tracking_performance = self.tracking_performance;
    }
}

/// Controller-to-client state snapshot for one cycle.
///
/// `header` and `connection_info` are always present; the other groups are
/// `None` when the controller did not send them. A reset message has every
/// optional group absent and the connection at `IDLE`/`POOR`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringMessage {
    #[serde(skip)]
    joint_count: JointCount,
    pub header: MessageHeader,
    pub connection_info: ConnectionInfo,
    pub robot_info: Option<RobotInfo>,
    pub monitor_data: Option<MonitorData>,
    pub ipo_data: Option<IpoData>,
    pub requested_transformations: Vec<String>,
}

impl MonitoringMessage {
    pub fn new(joint_count: JointCount) -> Self {
        Self {
            joint_count,
            header: MessageHeader {
                message_identifier: MONITORING_MESSAGE_ID,
                ..MessageHeader::default()
            },
            connection_info: ConnectionInfo::default(),
            robot_info: None,
            monitor_data: None,
            ipo_data: None,
            requested_transformations: Vec::new(),
        }
    }

    pub fn joint_count(&self) -> JointCount {
        self.joint_count
    }

    pub fn session_state(&self) -> SessionState {
        self.connection_info.session_state
    }

    /// Controller cycle time, if the controller reported its send period.
    pub fn sample_time(&self) -> Option<Duration> {
        self.connection_info
            .send_period_ms
            .map(|ms| Duration::from_millis(u64::from(ms)))
    }

    pub fn measured_joint_position(&self) -> Option<&[f64]> {
        self.monitor_data
            .as_ref()
            .map(|data| data.measured_joint_position.as_slice())
    }

    pub fn ipo_joint_position(&self) -> Option<&[f64]> {
        self.ipo_data
            .as_ref()
            .map(|data| data.joint_position.as_slice())
    }

    pub fn ipo_cartesian_pose(&self) -> Option<&CartesianPose> {
        self.ipo_data
            .as_ref()
            .and_then(|data| data.cartesian_pose.as_ref())
    }
}

impl WireMessage for MonitoringMessage {
    type Wire = proto::FriMonitoringMessage;

    const KIND: &'static str = "monitoring";

    fn with_joints(joint_count: JointCount) -> Self {
        Self::new(joint_count)
    }

    fn reset(&mut self) {
        self.header = MessageHeader::default();
        self.connection_info = ConnectionInfo::default();
        self.robot_info = None;
        self.monitor_data = None;
        self.ipo_data = None;
        self.requested_transformations.clear();
    }

    fn read_wire(&mut self, wire: &Self::Wire, mapper: &RepeatedFieldMapper) -> Result<()> {
        let header = wire
            .header
            .as_ref()
            .ok_or(MessageError::MissingField("header"))?;
        let info = wire
            .connection_info
            .as_ref()
            .ok_or(MessageError::MissingField("connectionInfo"))?;

        if wire.requested_transformations.len() > MAX_TRANSFORMATIONS {
            return Err(MessageError::Capacity {
                field: "requestedTransformations",
                len: wire.requested_transformations.len(),
                capacity: MAX_TRANSFORMATIONS,
            });
        }

        self.header = MessageHeader::from_wire(header);
        self.connection_info = ConnectionInfo {
            session_state: enum_from_wire("connectionInfo.sessionState", info.session_state)?,
            quality: enum_from_wire("connectionInfo.quality", info.quality)?,
            send_period_ms: info.send_period,
            receive_multiplier: info.receive_multiplier,
        };

        let count = self.joint_count;
        read_group(
            &mut self.robot_info,
            wire.robot_info.as_ref(),
            || RobotInfo::new(count),
            |local, wire| local.read_wire(wire, mapper),
        )?;
        read_group(
            &mut self.monitor_data,
            wire.monitor_data.as_ref(),
            || MonitorData::new(count),
            |local, wire| local.read_wire(wire, mapper),
        )?;
        read_group(
            &mut self.ipo_data,
            wire.ipo_data.as_ref(),
            || IpoData::new(count),
            |local, wire| local.read_wire(wire, mapper),
        )?;

        let names = &mut self.requested_transformations;
        names.truncate(wire.requested_transformations.len());
        for (i, transformation) in wire.requested_transformations.iter().enumerate() {
            match names.get_mut(i) {
                Some(name) => name.clone_from(&transformation.name),
                None => names.push(transformation.name.clone()),
            }
        }
        Ok(())
    }

    fn write_wire(&self, wire: &mut Self::Wire, mapper: &RepeatedFieldMapper) -> Result<()> {
        self.header.write_wire(&mut wire.header);
        let info = wire.connection_info.get_or_insert_with(Default::default);
        info.session_state = self.connection_info.session_state.into();
        info.quality = self.connection_info.quality.into();
        info.send_period = self.connection_info.send_period_ms;
        info.receive_multiplier = self.connection_info.receive_multiplier;

        write_group(self.robot_info.as_ref(), &mut wire.robot_info, |local, wire| {
            local.write_wire(wire, mapper)
        });
        write_group(self.monitor_data.as_ref(), &mut wire.monitor_data, |local, wire| {
            local.write_wire(wire, mapper)
        });
        write_group(self.ipo_data.as_ref(), &mut wire.ipo_data, |local, wire| {
            local.write_wire(wire, mapper)
        });

        let transformations = &mut wire.requested_transformations;
        transformations.truncate(self.requested_transformations.len());
        for (i, name) in self.requested_transformations.iter().enumerate() {
            match transformations.get_mut(i) {
                Some(transformation) => {
                    transformation.name.clone_from(name);
                    transformation.matrix.clear();
                }
                None => transformations.push(proto::Transformation {
                    name: name.clone(),
                    matrix: Vec::new(),
                }),
            }
        }
        Ok(())
    }
}

/// Decode an optional group into its local slot, reusing the slot's storage
/// when the group was present last time.
fn read_group<L, W>(
    local: &mut Option<L>,
    wire: Option<&W>,
    new: impl FnOnce() -> L,
    read: impl FnOnce(&mut L, &W) -> Result<()>,
) -> Result<()> {
    match wire {
        Some(wire) => read(local.get_or_insert_with(new), wire),
        None => {
            *local = None;
            Ok(())
        }
    }
}

/// Encode an optional group into its wire slot, reusing the slot's storage.
pub(crate) fn write_group<L, W: Default>(
    local: Option<&L>,
    wire: &mut Option<W>,
    write: impl FnOnce(&L, &mut W),
) {
    match local {
        Some(local) => write(local, wire.get_or_insert_with(W::default)),
        None => *wire = None,
    }
}

/// An absent joint field decodes like an empty one: `Incomplete`.
fn bind_joint_values(
    mapper: &RepeatedFieldMapper,
    field: &'static str,
    wire: &Option<proto::JointValues>,
    local: &mut JointArray<f64>,
) -> Result<()> {
    match wire {
        Some(values) => mapper.bind_decode(field, &values.value, local),
        None => mapper.bind_decode(field, &WireArray::<f64, MAX_JOINTS>::new(), local),
    }
}

pub(crate) fn joint_values_to_wire(
    mapper: &RepeatedFieldMapper,
    local: &JointArray<f64>,
    wire: &mut Option<proto::JointValues>,
) {
    let wire = wire.get_or_insert_with(Default::default);
    mapper.bind_encode(local, &mut wire.value);
}

pub(crate) fn pose_from_wire(
    field: &'static str,
    wire: &proto::CartesianVector,
) -> Result<CartesianPose> {
    decode_fixed(field, &wire.element).map(CartesianPose)
}

pub(crate) fn pose_to_wire(
    pose: Option<&CartesianPose>,
    wire: &mut Option<proto::CartesianVector>,
) {
    write_group(pose, wire, |pose, wire| {
        wire.element.clear();
        wire.element.extend_from_slice(&pose.0);
    });
}
