use std::ops::RangeInclusive;

use heaterlink_frame::{SET_LEVEL, SET_MODE, START_STOP, STATUS};

use crate::error::{LinkError, Result};

/// Accepted power levels.
pub const LEVEL_RANGE: RangeInclusive<i64> = 1..=36;

/// Accepted mode codes (1 = power level, 2 = temperature).
pub const MODE_RANGE: RangeInclusive<i64> = 1..=2;

/// Accepted target temperatures in °C.
pub const TEMPERATURE_RANGE: RangeInclusive<i64> = 8..=36;

/// A user-level heater command.
///
/// Arguments are kept as plain integers so that anything a remote user sends
/// can be represented and rejected by [`HeaterCommand::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterCommand {
    QueryStatus,
    Start,
    Stop,
    SetLevel(i64),
    SetTemperature(i64),
    SetMode(i64),
}

impl HeaterCommand {
    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            HeaterCommand::QueryStatus => "query-status",
            HeaterCommand::Start => "start",
            HeaterCommand::Stop => "stop",
            HeaterCommand::SetLevel(_) => "set-level",
            HeaterCommand::SetTemperature(_) => "set-temperature",
            HeaterCommand::SetMode(_) => "set-mode",
        }
    }

    /// Validate and translate into a `(command code, argument)` pair.
    pub fn request(self) -> Result<(u8, u16)> {
        match self {
            HeaterCommand::QueryStatus => Ok((STATUS, 0)),
            HeaterCommand::Start => Ok((START_STOP, 1)),
            HeaterCommand::Stop => Ok((START_STOP, 0)),
            HeaterCommand::SetLevel(level) => {
                Ok((SET_LEVEL, checked("level", level, LEVEL_RANGE)?))
            }
            HeaterCommand::SetTemperature(celsius) => Ok((
                SET_LEVEL,
                checked("temperature", celsius, TEMPERATURE_RANGE)?,
            )),
            HeaterCommand::SetMode(mode) => Ok((SET_MODE, checked("mode", mode, MODE_RANGE)?)),
        }
    }
}

fn checked(what: &'static str, value: i64, range: RangeInclusive<i64>) -> Result<u16> {
    if !range.contains(&value) {
        return Err(LinkError::InvalidArgument { what, value, range });
    }
    u16::try_from(value).map_err(|_| LinkError::InvalidArgument { what, value, range })
}
