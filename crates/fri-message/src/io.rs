use serde::Serialize;

use crate::error::{MessageError, Result};
use crate::proto;
use crate::types::{enum_from_wire, IoDirection, IoType};

/// Maximum I/O values carried by one message.
pub const MAX_IO_VALUES: usize = 10;

/// A named controller I/O signal and its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IoValue {
    pub name: String,
    pub direction: IoDirection,
    pub value: IoPayload,
}

/// Typed I/O value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum IoPayload {
    Boolean(bool),
    Digital(u64),
    Analog(f64),
}

impl IoPayload {
    pub fn io_type(&self) -> IoType {
        match self {
            IoPayload::Boolean(_) => IoType::Boolean,
            IoPayload::Digital(_) => IoType::Digital,
            IoPayload::Analog(_) => IoType::Analog,
        }
    }
}

impl IoValue {
    fn from_wire(wire: &proto::IoValue) -> Result<Self> {
        let (direction, value) = typed_value(wire)?;
        Ok(Self {
            name: wire.name.clone(),
            direction,
            value,
        })
    }

    // Overwrite in place; the name keeps its buffer.
    fn read_wire(&mut self, wire: &proto::IoValue) -> Result<()> {
        let (direction, value) = typed_value(wire)?;
        self.name.clone_from(&wire.name);
        self.direction = direction;
        self.value = value;
        Ok(())
    }

    fn write_wire(&self, wire: &mut proto::IoValue) {
        let (digital_value, analog_value) = match self.value {
            IoPayload::Boolean(value) => (Some(u64::from(value)), None),
            IoPayload::Digital(value) => (Some(value), None),
            IoPayload::Analog(value) => (None, Some(value)),
        };
        wire.name.clone_from(&self.name);
        wire.io_type = self.value.io_type().into();
        wire.direction = self.direction.into();
        wire.digital_value = digital_value;
        wire.analog_value = analog_value;
    }
}

fn typed_value(wire: &proto::IoValue) -> Result<(IoDirection, IoPayload)> {
    let io_type: IoType = enum_from_wire("ioValue.type", wire.io_type)?;
    let direction = enum_from_wire("ioValue.direction", wire.direction)?;
    let value = match io_type {
        IoType::Boolean => IoPayload::Boolean(
            wire.digital_value
                .ok_or(MessageError::MissingField("ioValue.digitalValue"))?
                != 0,
        ),
        IoType::Digital => IoPayload::Digital(
            wire.digital_value
                .ok_or(MessageError::MissingField("ioValue.digitalValue"))?,
        ),
        IoType::Analog => IoPayload::Analog(
            wire.analog_value
                .ok_or(MessageError::MissingField("ioValue.analogValue"))?,
        ),
    };
    Ok((direction, value))
}

/// Wire list to local list. Existing entries are overwritten in place.
pub(crate) fn decode_io_list(
    field: &'static str,
    wire: &[proto::IoValue],
    local: &mut Vec<IoValue>,
) -> Result<()> {
    if wire.len() > MAX_IO_VALUES {
        return Err(MessageError::Capacity {
            field,
            len: wire.len(),
            capacity: MAX_IO_VALUES,
        });
    }
    local.truncate(wire.len());
    for (i, value) in wire.iter().enumerate() {
        match local.get_mut(i) {
            Some(slot) => slot.read_wire(value)?,
            None => local.push(IoValue::from_wire(value)?),
        }
    }
    Ok(())
}

/// Local list to wire list. Existing entries are overwritten in place.
pub(crate) fn encode_io_list(local: &[IoValue], wire: &mut Vec<proto::IoValue>) {
    wire.truncate(local.len());
    for (i, value) in local.iter().enumerate() {
        match wire.get_mut(i) {
            Some(slot) => value.write_wire(slot),
            None => {
                let mut slot = proto::IoValue::default();
                value.write_wire(&mut slot);
                wire.push(slot);
            }
        }
    }
}
