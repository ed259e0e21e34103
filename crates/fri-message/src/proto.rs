//! Protobuf wire schema of the monitoring and command payloads.
//!
//! These structs mirror the fixed controller schema field-for-field. They are
//! only used as parse/serialize scratch space by the codec; applications see
//! [`MonitoringMessage`](crate::MonitoringMessage) and
//! [`CommandMessage`](crate::CommandMessage).
//!
//! Per-joint, pose and wrench arrays live in [`WireArray`]s with inline
//! storage, so parsing and serializing those groups never touches the heap.

#![allow(clippy::enum_variant_names)]

use std::fmt;

use bytes::{Buf, BufMut};
use prost::encoding::{self, decode_varint, skip_field, DecodeContext, WireType};
use prost::DecodeError;

use crate::joints::{CARTESIAN_POSE_LEN, MAX_JOINTS};
use crate::types::{
    ClientCommandMode, ConnectionQuality, IoDirection, IoType, OverlayType, SessionState,
};

/// Repeated scalar field with inline storage for `N` elements.
///
/// Elements past `N` are counted but not stored, so [`len`](Self::len) is
/// always the wire length and the mapper can report the overflow.
#[derive(Clone, Copy)]
pub struct WireArray<T, const N: usize> {
    values: [T; N],
    len: usize,
}

impl<T: Copy + Default, const N: usize> WireArray<T, N> {
    pub fn new() -> Self {
        Self {
            values: [T::default(); N],
            len: 0,
        }
    }

    pub fn from_slice(values: &[T]) -> Self {
        let mut array = Self::new();
        array.extend_from_slice(values);
        array
    }

    /// Number of elements seen on the wire, including any past capacity.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// The stored elements.
    pub fn as_slice(&self) -> &[T] {
        &self.values[..self.len.min(N)]
    }

    pub fn push(&mut self, value: T) {
        if let Some(slot) = self.values.get_mut(self.len) {
            *slot = value;
        }
        self.len = self.len.saturating_add(1);
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        for &value in values {
            self.push(value);
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for WireArray<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default + PartialEq, const N: usize> PartialEq for WireArray<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Default + fmt::Debug, const N: usize> fmt::Debug for WireArray<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

fn merge_doubles<B: Buf, const N: usize>(
    array: &mut WireArray<f64, N>,
    wire_type: WireType,
    buf: &mut B,
    ctx: DecodeContext,
) -> Result<(), DecodeError> {
    if wire_type != WireType::LengthDelimited {
        let mut value = 0.0;
        encoding::double::merge(wire_type, &mut value, buf, ctx)?;
        array.push(value);
        return Ok(());
    }
    let len = decode_varint(buf)?;
    if len > buf.remaining() as u64 || len % 8 != 0 {
        return Err(DecodeError::new("invalid packed double length"));
    }
    for _ in 0..len / 8 {
        array.push(buf.get_f64_le());
    }
    Ok(())
}

fn merge_int32s<B: Buf, const N: usize>(
    array: &mut WireArray<i32, N>,
    wire_type: WireType,
    buf: &mut B,
    ctx: DecodeContext,
) -> Result<(), DecodeError> {
    if wire_type != WireType::LengthDelimited {
        let mut value = 0;
        encoding::int32::merge(wire_type, &mut value, buf, ctx)?;
        array.push(value);
        return Ok(());
    }
    let len = decode_varint(buf)?;
    if len > buf.remaining() as u64 {
        return Err(DecodeError::new("buffer underflow"));
    }
    let limit = buf.remaining() - len as usize;
    while buf.remaining() > limit {
        array.push(decode_varint(buf)? as i32);
    }
    if buf.remaining() != limit {
        return Err(DecodeError::new("delimited length exceeded"));
    }
    Ok(())
}

/// Per-joint values.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct JointValues {
    pub value: WireArray<f64, MAX_JOINTS>,
}

impl prost::Message for JointValues {
    fn encode_raw<B: BufMut>(&self, buf: &mut B) {
        encoding::double::encode_packed(1, self.value.as_slice(), buf);
    }

    fn merge_field<B: Buf>(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => merge_doubles(&mut self.value, wire_type, buf, ctx),
            _ => skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::double::encoded_len_packed(1, self.value.as_slice())
    }

    fn clear(&mut self) {
        self.value.clear();
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TimeStamp {
    #[prost(uint32, tag = "1")]
    pub sec: u32,
    #[prost(uint32, tag = "2")]
    pub nanosec: u32,
}

/// Pose (7 elements) or wrench (6 elements).
#[derive(Clone, Default, PartialEq, Debug)]
pub struct CartesianVector {
    pub element: WireArray<f64, CARTESIAN_POSE_LEN>,
}

impl prost::Message for CartesianVector {
    fn encode_raw<B: BufMut>(&self, buf: &mut B) {
        encoding::double::encode_packed(1, self.element.as_slice(), buf);
    }

    fn merge_field<B: Buf>(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => merge_doubles(&mut self.element, wire_type, buf, ctx),
            _ => skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        encoding::double::encoded_len_packed(1, self.element.as_slice())
    }

    fn clear(&mut self) {
        self.element.clear();
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Transformation {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(double, repeated, tag = "2")]
    pub matrix: Vec<f64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct IoValue {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(enumeration = "IoType", tag = "2")]
    pub io_type: i32,
    #[prost(enumeration = "IoDirection", tag = "3")]
    pub direction: i32,
    #[prost(uint64, optional, tag = "4")]
    pub digital_value: Option<u64>,
    #[prost(double, optional, tag = "5")]
    pub analog_value: Option<f64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MessageHeader {
    #[prost(uint32, tag = "1")]
    pub message_identifier: u32,
    #[prost(uint32, tag = "2")]
    pub sequence_counter: u32,
    #[prost(uint32, tag = "3")]
    pub reflected_sequence_counter: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConnectionInfo {
    #[prost(enumeration = "SessionState", tag = "1")]
    pub session_state: i32,
    #[prost(enumeration = "ConnectionQuality", tag = "2")]
    pub quality: i32,
    #[prost(uint32, optional, tag = "3")]
    pub send_period: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    pub receive_multiplier: Option<u32>,
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct RobotInfo {
    pub number_of_joints: Option<u32>,
    /// [`DriveState`](crate::types::DriveState) per joint.
    pub drive_state: WireArray<i32, MAX_JOINTS>,
    /// [`SafetyState`](crate::types::SafetyState).
    pub safety_state: i32,
    /// [`OperationMode`](crate::types::OperationMode).
    pub operation_mode: i32,
    /// [`ControlMode`](crate::types::ControlMode).
    pub control_mode: i32,
}

impl prost::Message for RobotInfo {
    fn encode_raw<B: BufMut>(&self, buf: &mut B) {
        if let Some(number_of_joints) = &self.number_of_joints {
            encoding::uint32::encode(1, number_of_joints, buf);
        }
        encoding::int32::encode_packed(2, self.drive_state.as_slice(), buf);
        if self.safety_state != 0 {
            encoding::int32::encode(5, &self.safety_state, buf);
        }
        if self.operation_mode != 0 {
            encoding::int32::encode(7, &self.operation_mode, buf);
        }
        if self.control_mode != 0 {
            encoding::int32::encode(8, &self.control_mode, buf);
        }
    }

    fn merge_field<B: Buf>(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => encoding::uint32::merge(
                wire_type,
                self.number_of_joints.get_or_insert(0),
                buf,
                ctx,
            ),
            2 => merge_int32s(&mut self.drive_state, wire_type, buf, ctx),
            5 => encoding::int32::merge(wire_type, &mut self.safety_state, buf, ctx),
            7 => encoding::int32::merge(wire_type, &mut self.operation_mode, buf, ctx),
            8 => encoding::int32::merge(wire_type, &mut self.control_mode, buf, ctx),
            _ => skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = encoding::int32::encoded_len_packed(2, self.drive_state.as_slice());
        if let Some(number_of_joints) = &self.number_of_joints {
            len += encoding::uint32::encoded_len(1, number_of_joints);
        }
        if self.safety_state != 0 {
            len += encoding::int32::encoded_len(5, &self.safety_state);
        }
        if self.operation_mode != 0 {
            len += encoding::int32::encoded_len(7, &self.operation_mode);
        }
        if self.control_mode != 0 {
            len += encoding::int32::encoded_len(8, &self.control_mode);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MonitorData {
    #[prost(message, optional, tag = "1")]
    pub measured_joint_position: Option<JointValues>,
    #[prost(message, optional, tag = "2")]
    pub measured_torque: Option<JointValues>,
    #[prost(message, optional, tag = "4")]
    pub commanded_torque: Option<JointValues>,
    #[prost(message, optional, tag = "5")]
    pub external_torque: Option<JointValues>,
    #[prost(message, repeated, tag = "8")]
    pub read_io_request: Vec<IoValue>,
    #[prost(message, optional, tag = "9")]
    pub measured_cartesian_pose: Option<CartesianVector>,
    #[prost(double, optional, tag = "10")]
    pub measured_redundancy: Option<f64>,
    #[prost(message, optional, tag = "15")]
    pub timestamp: Option<TimeStamp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct IpoData {
    #[prost(message, optional, tag = "1")]
    pub joint_position: Option<JointValues>,
    #[prost(message, optional, tag = "2")]
    pub cartesian_pose: Option<CartesianVector>,
    #[prost(double, optional, tag = "3")]
    pub redundancy: Option<f64>,
    #[prost(enumeration = "ClientCommandMode", tag = "10")]
    pub client_command_mode: i32,
    #[prost(enumeration = "OverlayType", tag = "11")]
    pub overlay_type: i32,
    #[prost(double, optional, tag = "12")]
    pub tracking_performance: Option<f64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FriMonitoringMessage {
    #[prost(message, optional, tag = "1")]
    pub header: Option<MessageHeader>,
    #[prost(message, optional, tag = "2")]
    pub robot_info: Option<RobotInfo>,
    #[prost(message, optional, tag = "3")]
    pub monitor_data: Option<MonitorData>,
    #[prost(message, optional, tag = "4")]
    pub connection_info: Option<ConnectionInfo>,
    #[prost(message, optional, tag = "5")]
    pub ipo_data: Option<IpoData>,
    #[prost(message, repeated, tag = "6")]
    pub requested_transformations: Vec<Transformation>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CommandData {
    #[prost(message, optional, tag = "1")]
    pub joint_position: Option<JointValues>,
    #[prost(message, optional, tag = "2")]
    pub cartesian_wrench_feed_forward: Option<CartesianVector>,
    #[prost(message, optional, tag = "3")]
    pub joint_torque: Option<JointValues>,
    #[prost(message, repeated, tag = "5")]
    pub write_io_request: Vec<IoValue>,
    #[prost(message, optional, tag = "6")]
    pub cartesian_pose: Option<CartesianVector>,
    #[prost(double, optional, tag = "7")]
    pub redundancy: Option<f64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FriCommandMessage {
    #[prost(message, optional, tag = "1")]
    pub header: Option<MessageHeader>,
    #[prost(message, optional, tag = "2")]
    pub command_data: Option<CommandData>,
}
