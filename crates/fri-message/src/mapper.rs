//! Binding between variable-length wire arrays and fixed-capacity local arrays.

use crate::error::{MessageError, Result};
use crate::joints::{JointArray, JointCount};
use crate::proto::WireArray;

/// Copies per-joint arrays between the wire schema and local storage.
///
/// The joint count is fixed at construction. Decoding demands exactly that
/// many elements on the wire; encoding always emits exactly that many.
/// Both sides are inline arrays, so neither direction allocates.
#[derive(Debug, Clone, Copy)]
pub struct RepeatedFieldMapper {
    count: JointCount,
}

impl RepeatedFieldMapper {
    pub fn new(count: JointCount) -> Self {
        Self { count }
    }

    pub fn count(&self) -> JointCount {
        self.count
    }

    /// Wire to local. More elements than the joint count is a capacity error,
    /// fewer is an incomplete field; neither is truncated or padded.
    pub fn bind_decode<T: Copy + Default, const N: usize>(
        &self,
        field: &'static str,
        wire: &WireArray<T, N>,
        local: &mut JointArray<T>,
    ) -> Result<()> {
        check_len(field, wire.len(), self.count.get())?;
        local.assign(wire.as_slice())
    }

    /// Local to wire. The wire array's length becomes the joint count.
    pub fn bind_encode<T: Copy + Default, const N: usize>(
        &self,
        local: &JointArray<T>,
        wire: &mut WireArray<T, N>,
    ) {
        wire.clear();
        wire.extend_from_slice(&local[..self.count.get().min(local.len())]);
    }

    /// Wire to a fresh local array of the configured joint count.
    pub fn decode_array<T: Copy + Default, const N: usize>(
        &self,
        field: &'static str,
        wire: &WireArray<T, N>,
    ) -> Result<JointArray<T>> {
        let mut local = JointArray::new(self.count);
        self.bind_decode(field, wire, &mut local)?;
        Ok(local)
    }
}

/// Wire to a fixed-size array such as a Cartesian pose or wrench.
pub fn decode_fixed<const N: usize, const C: usize>(
    field: &'static str,
    wire: &WireArray<f64, C>,
) -> Result<[f64; N]> {
    check_len(field, wire.len(), N)?;
    let mut local = [0.0; N];
    local.copy_from_slice(wire.as_slice());
    Ok(local)
}

fn check_len(field: &'static str, len: usize, expected: usize) -> Result<()> {
    if len > expected {
        return Err(MessageError::Capacity {
            field,
            len,
            capacity: expected,
        });
    }
    if len < expected {
        return Err(MessageError::Incomplete {
            field,
            len,
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::{CARTESIAN_POSE_LEN, MAX_JOINTS};

    type Joints = WireArray<f64, MAX_JOINTS>;
    type Vector = WireArray<f64, CARTESIAN_POSE_LEN>;

    fn mapper(count: usize) -> RepeatedFieldMapper {
        RepeatedFieldMapper::new(JointCount::new(count).unwrap())
    }

    #[test]
    fn decode_copies_exact_count() {
        let mapper = mapper(3);
        let local = mapper
            .decode_array("measuredJointPosition", &Joints::from_slice(&[0.1, 0.2, 0.3]))
            .unwrap();
        assert_eq!(local.as_slice(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn decode_rejects_excess_elements() {
        let mapper = mapper(7);
        let wire = Joints::from_slice(&[0.0; 8]);
        let err = mapper
            .decode_array("measuredJointPosition", &wire)
            .unwrap_err();
        assert!(matches!(
            err,
            MessageError::Capacity {
                field: "measuredJointPosition",
                len: 8,
                capacity: 7
            }
        ));
    }

    #[test]
    fn decode_reports_length_past_wire_capacity() {
        let mapper = mapper(12);
        let wire = Joints::from_slice(&[0.0; 20]);
        assert_eq!(wire.as_slice().len(), 12);
        let err = mapper.decode_array("jointPosition", &wire).unwrap_err();
        assert!(matches!(
            err,
            MessageError::Capacity {
                len: 20,
                capacity: 12,
                ..
            }
        ));
    }

    #[test]
    fn decode_rejects_missing_elements() {
        let mapper = mapper(7);
        let err = mapper
            .decode_array("measuredTorque", &Joints::new())
            .unwrap_err();
        assert!(matches!(
            err,
            MessageError::Incomplete {
                len: 0,
                expected: 7,
                ..
            }
        ));
    }

    #[test]
    fn decode_failure_leaves_local_untouched() {
        let mapper = mapper(2);
        let mut local = JointArray::from_slice(mapper.count(), &[4.0, 5.0]).unwrap();
        assert!(mapper
            .bind_decode("externalTorque", &Joints::from_slice(&[1.0, 2.0, 3.0]), &mut local)
            .is_err());
        assert_eq!(local.as_slice(), &[4.0, 5.0]);
    }

    #[test]
    fn encode_sets_wire_length_to_count() {
        let mapper = mapper(3);
        let local = JointArray::from_slice(mapper.count(), &[1, 2, 3]).unwrap();
        let mut wire = WireArray::<i32, 12>::from_slice(&[9, 9, 9, 9, 9]);

        mapper.bind_encode(&local, &mut wire);
        assert_eq!(wire.as_slice(), &[1, 2, 3]);
        assert_eq!(wire.len(), 3);
    }

    #[test]
    fn fixed_arrays_need_exact_length() {
        let pose: [f64; 3] = decode_fixed("pose", &Vector::from_slice(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(pose, [1.0, 2.0, 3.0]);
        assert!(matches!(
            decode_fixed::<3, 7>("pose", &Vector::from_slice(&[1.0, 2.0, 3.0, 4.0])),
            Err(MessageError::Capacity { .. })
        ));
        assert!(matches!(
            decode_fixed::<3, 7>("pose", &Vector::from_slice(&[1.0])),
            Err(MessageError::Incomplete { .. })
        ));
    }
}
