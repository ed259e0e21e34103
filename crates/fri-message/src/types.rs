//! Enumerations shared by the wire schema and the decoded messages.
//!
//! Discriminants are the wire values.

use std::fmt;

use serde::Serialize;

use crate::error::{MessageError, Result};

/// Convert a wire enumeration value, rejecting values outside the range.
pub(crate) fn enum_from_wire<E: TryFrom<i32>>(field: &'static str, value: i32) -> Result<E> {
    E::try_from(value).map_err(|_| MessageError::UnknownEnumValue { field, value })
}

/// Controller-declared session state.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum SessionState {
    Idle = 0,
    MonitoringWait = 1,
    MonitoringReady = 2,
    CommandingWait = 3,
    CommandingActive = 4,
}

impl SessionState {
    /// Wire-style name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::MonitoringWait => "MONITORING_WAIT",
            SessionState::MonitoringReady => "MONITORING_READY",
            SessionState::CommandingWait => "COMMANDING_WAIT",
            SessionState::CommandingActive => "COMMANDING_ACTIVE",
        }
    }

    /// True for the two monitoring states.
    pub fn is_monitoring(self) -> bool {
        matches!(
            self,
            SessionState::MonitoringWait | SessionState::MonitoringReady
        )
    }

    /// True for the two commanding states.
    pub fn is_commanding(self) -> bool {
        matches!(
            self,
            SessionState::CommandingWait | SessionState::CommandingActive
        )
    }

    /// True only while the controller accepts motion commands.
    pub fn is_commanding_active(self) -> bool {
        self == SessionState::CommandingActive
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link quality as judged by the controller.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ConnectionQuality {
    Poor = 0,
    Fair = 1,
    Good = 2,
    Excellent = 3,
}

impl ConnectionQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionQuality::Poor => "POOR",
            ConnectionQuality::Fair => "FAIR",
            ConnectionQuality::Good => "GOOD",
            ConnectionQuality::Excellent => "EXCELLENT",
        }
    }
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-axis drive state.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum DriveState {
    Off = 0,
    Transitioning = 1,
    Active = 2,
}

/// Controller safety state.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum SafetyState {
    NormalOperation = 0,
    SafetyStopLevel0 = 1,
    SafetyStopLevel1 = 2,
    SafetyStopLevel2 = 3,
}

/// Robot operation mode.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum OperationMode {
    Test1 = 0,
    Test2 = 1,
    Automatic = 2,
}

/// Active controller-side control mode.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ControlMode {
    Position = 0,
    CartesianImpedance = 1,
    JointImpedance = 2,
    NoControl = 3,
}

/// Which command type the controller expects from the client.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ClientCommandMode {
    NoCommand = 0,
    JointPosition = 1,
    Wrench = 2,
    Torque = 3,
    CartesianPose = 4,
}

/// Overlay the controller superimposes client commands on.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum OverlayType {
    NoOverlay = 0,
    Joint = 1,
    Cartesian = 2,
}

/// Value type of an I/O signal.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum IoType {
    Boolean = 0,
    Digital = 1,
    Analog = 2,
}

/// Direction of an I/O signal as seen from the controller.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum IoDirection {
    Input = 0,
    Output = 1,
}
