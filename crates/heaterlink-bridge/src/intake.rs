use heaterlink_frame::RunningMode;
use heaterlink_link::HeaterCommand;
use heaterlink_state::topics::{LEVEL, MODE, START, STOP, TEMPERATURE};
use heaterlink_state::DeviceTopics;

use crate::error::{BridgeError, Result};

/// Translate an inbound broker message into a heater command.
///
/// `start` and `stop` ignore their payload. `level` and `temperature` take a
/// decimal integer; surrounding whitespace is allowed. `mode` takes a mode
/// name as published on the `mode` state topic. Range checks are left to the
/// link so they are enforced in one place.
pub fn parse_command(topics: &DeviceTopics, topic: &str, payload: &[u8]) -> Result<HeaterCommand> {
    let control = topics
        .command_control(topic)
        .ok_or_else(|| BridgeError::UnknownTopic(topic.to_string()))?;

    let invalid = || BridgeError::InvalidPayload {
        control,
        payload: String::from_utf8_lossy(payload).into_owned(),
    };
    let text = || std::str::from_utf8(payload).map(str::trim).map_err(|_| invalid());

    match control {
        START => Ok(HeaterCommand::Start),
        STOP => Ok(HeaterCommand::Stop),
        LEVEL => {
            let level = text()?.parse::<i64>().map_err(|_| invalid())?;
            Ok(HeaterCommand::SetLevel(level))
        }
        TEMPERATURE => {
            let celsius = text()?.parse::<i64>().map_err(|_| invalid())?;
            Ok(HeaterCommand::SetTemperature(celsius))
        }
        MODE => {
            let mode = RunningMode::from_name(text()?).ok_or_else(invalid)?;
            Ok(HeaterCommand::SetMode(i64::from(mode.code())))
        }
        _ => Err(BridgeError::UnknownTopic(topic.to_string())),
    }
}
