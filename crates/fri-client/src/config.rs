use fri_frame::FrameConfig;
use fri_message::{JointCount, MAX_JOINTS};

use crate::error::{ClientError, Result};

/// Configuration for the cycle engine.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Number of robot joints. Default: 7.
    pub joint_count: usize,
    /// Frame limits applied to both directions.
    pub frame: FrameConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            joint_count: 7,
            frame: FrameConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Validated joint count.
    pub fn joint_count(&self) -> Result<JointCount> {
        JointCount::new(self.joint_count).map_err(|_| {
            ClientError::InvalidConfig(format!(
                "joint count {} is outside 1..={MAX_JOINTS}",
                self.joint_count
            ))
        })
    }
}
