//! Topic names relative to the per-device prefix.

pub const STATUS: &str = "status";
pub const ROOM_TEMPERATURE: &str = "room_temperature";
pub const HEATER_TEMPERATURE: &str = "heater_temperature";
pub const VOLTAGE: &str = "voltage";
pub const ALTITUDE: &str = "altitude";
pub const MODE: &str = "mode";
pub const LEVEL: &str = "level";
pub const TEMPERATURE: &str = "temperature";
pub const START: &str = "start";
pub const STOP: &str = "stop";

/// Controls that carry an availability topic, in publish order.
pub const CONTROLS: [&str; 5] = [STOP, START, LEVEL, TEMPERATURE, MODE];

/// Controls that accept commands.
pub const COMMANDS: [&str; 5] = [START, STOP, LEVEL, TEMPERATURE, MODE];

const STATE_SUFFIX: &str = "state";
const AVAILABILITY_SUFFIX: &str = "av";
const COMMAND_SUFFIX: &str = "cmd";

/// Device identifier derived from the link address: `BYD-` followed by the
/// address without separators, uppercased.
pub fn device_id(address: &str) -> String {
    let compact: String = address
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect();
    format!("BYD-{}", compact.to_uppercase())
}

/// Topic builder for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTopics {
    base: String,
}

impl DeviceTopics {
    /// `prefix` may be empty or end in `/`; the device id is appended.
    pub fn new(prefix: &str, device_id: &str) -> Self {
        Self {
            base: format!("{}/{device_id}", prefix.trim_end_matches('/')),
        }
    }

    /// `<prefix>/<device_id>`
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn state(&self, control: &str) -> String {
        format!("{}/{control}/{STATE_SUFFIX}", self.base)
    }

    pub fn availability(&self, control: &str) -> String {
        format!("{}/{control}/{AVAILABILITY_SUFFIX}", self.base)
    }

    pub fn command(&self, control: &str) -> String {
        format!("{}/{control}/{COMMAND_SUFFIX}", self.base)
    }

    /// All command topics to subscribe to.
    pub fn command_topics(&self) -> Vec<String> {
        COMMANDS.iter().map(|control| self.command(control)).collect()
    }

    /// Map an inbound topic back to the control it commands.
    pub fn command_control(&self, topic: &str) -> Option<&'static str> {
        let rest = topic.strip_prefix(&self.base)?.strip_prefix('/')?;
        let control = rest.strip_suffix(COMMAND_SUFFIX)?.strip_suffix('/')?;
        COMMANDS.iter().copied().find(|candidate| *candidate == control)
    }
}
