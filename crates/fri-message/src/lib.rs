//! Monitoring and command messages of the cyclic controller protocol.
//!
//! Payloads are protobuf, carried inside checksum-verified frames from
//! `fri-frame`. Per-joint arrays are stored in fixed-capacity
//! [`JointArray`]s sized once from a [`JointCount`]; a wire array longer
//! than the joint count is a capacity error, never a silent truncation.
//!
//! ```no_run
//! use fri_message::{JointCount, MessageDecoder, MonitoringMessage};
//!
//! # fn main() -> fri_message::Result<()> {
//! let mut decoder = MessageDecoder::<MonitoringMessage>::new(JointCount::new(7)?);
//! # let datagram: Vec<u8> = Vec::new();
//! let message = decoder.decode(&datagram)?;
//! println!("{}", message.session_state());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod io;
pub mod joints;
pub mod mapper;
pub mod monitoring;
pub mod proto;
pub mod types;

pub use codec::{MessageDecoder, MessageEncoder, WireMessage};
pub use command::{CommandData, CommandMessage, COMMAND_MESSAGE_ID};
pub use error::{DecodeFailureKind, MessageError, Result};
pub use io::{IoPayload, IoValue, MAX_IO_VALUES};
pub use joints::{
    CartesianPose, JointArray, JointCount, Timestamp, Wrench, CARTESIAN_POSE_LEN, MAX_JOINTS,
    WRENCH_LEN,
};
pub use mapper::RepeatedFieldMapper;
pub use monitoring::{
    ConnectionInfo, IpoData, MessageHeader, MonitorData, MonitoringMessage, RobotInfo,
    MAX_TRANSFORMATIONS, MONITORING_MESSAGE_ID,
};
pub use types::{
    ClientCommandMode, ConnectionQuality, ControlMode, DriveState, IoDirection, IoType,
    OperationMode, OverlayType, SafetyState, SessionState,
};
