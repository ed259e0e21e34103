use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Serialize, Serializer};

use crate::error::{MessageError, Result};

/// Wire-format maximum number of joints in any per-joint array.
pub const MAX_JOINTS: usize = 12;

/// Elements of a Cartesian pose: translation x, y, z (mm) followed by the
/// unit quaternion w, x, y, z.
pub const CARTESIAN_POSE_LEN: usize = 7;

/// Elements of a Cartesian wrench: force x, y, z (N) then torque x, y, z (Nm).
pub const WRENCH_LEN: usize = 6;

/// Number of robot joints, fixed for the lifetime of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointCount(usize);

impl JointCount {
    /// Validate a joint count against the wire-format capacity.
    pub fn new(count: usize) -> Result<Self> {
        if count == 0 || count > MAX_JOINTS {
            return Err(MessageError::InvalidJointCount {
                count,
                max: MAX_JOINTS,
            });
        }
        Ok(Self(count))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for JointCount {
    /// Seven axes, the common lightweight-arm layout.
    fn default() -> Self {
        Self(7)
    }
}

impl TryFrom<usize> for JointCount {
    type Error = MessageError;

    fn try_from(count: usize) -> Result<Self> {
        Self::new(count)
    }
}

impl fmt::Display for JointCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fixed-capacity per-joint array.
///
/// Storage is `[T; MAX_JOINTS]` inline; the active length is set once from a
/// [`JointCount`] and never changes. Derefs to the active slice.
#[derive(Clone, Copy)]
pub struct JointArray<T: Copy + Default> {
    values: [T; MAX_JOINTS],
    len: usize,
}

impl<T: Copy + Default> JointArray<T> {
    /// An array of `count` default values.
    pub fn new(count: JointCount) -> Self {
        Self {
            values: [T::default(); MAX_JOINTS],
            len: count.get(),
        }
    }

    /// Build from a slice whose length must equal `count`.
    pub fn from_slice(count: JointCount, values: &[T]) -> Result<Self> {
        let mut array = Self::new(count);
        array.assign(values)?;
        Ok(array)
    }

    /// Overwrite all active values. `values` must have exactly the active length.
    pub fn assign(&mut self, values: &[T]) -> Result<()> {
        if values.len() != self.len {
            return Err(MessageError::LengthMismatch {
                expected: self.len,
                actual: values.len(),
            });
        }
        self.values[..self.len].copy_from_slice(values);
        Ok(())
    }

    /// Reset every active value to its default.
    pub fn clear(&mut self) {
        self.values[..self.len].fill(T::default());
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values[..self.len]
    }
}

impl<T: Copy + Default> Deref for JointArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy + Default> DerefMut for JointArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy + Default + PartialEq> PartialEq for JointArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Default + fmt::Debug> fmt::Debug for JointArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: Copy + Default + Serialize> Serialize for JointArray<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

/// Cartesian pose: translation (mm) and unit quaternion (w, x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CartesianPose(pub [f64; CARTESIAN_POSE_LEN]);

impl CartesianPose {
    pub fn translation(&self) -> [f64; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn quaternion(&self) -> [f64; 4] {
        [self.0[3], self.0[4], self.0[5], self.0[6]]
    }
}

/// Cartesian wrench: force (N) and torque (Nm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Wrench(pub [f64; WRENCH_LEN]);

/// Controller time of a monitoring sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Timestamp {
    pub sec: u32,
    pub nanosec: u32,
}
