use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::MARKER;
use crate::error::{FrameError, Result};

/// Minimum size of an inbound telemetry frame.
pub const TELEMETRY_FRAME_MIN_LEN: usize = 17;

/// Fault descriptions indexed by the error byte.
pub const FAULT_MESSAGES: [&str; 11] = [
    "No fault",
    "Startup failure",
    "Lack of fuel",
    "Supply voltage overrun",
    "Outlet sensor fault",
    "Inlet sensor fault",
    "Pulse pump fault",
    "Fan fault",
    "Ignition unit fault",
    "Overheating",
    "Overheat sensor fault",
];

/// Lifecycle phase names indexed by the running step byte.
pub const RUNNING_STEP_MESSAGES: [&str; 5] =
    ["Standby", "Self-test", "Ignition", "Running", "Cooldown"];

const UNKNOWN: &str = "Unknown";

/// Heater operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunningMode {
    /// Power-level control, reported as mode 0.
    ImplicitLevel,
    /// Power-level control, reported as mode 1.
    Level,
    /// Target-temperature control.
    Temperature,
}

impl RunningMode {
    /// Names used on the messaging side, indexed by `code - 1`.
    pub const NAMES: [&'static str; 2] = ["Power Level", "Temperature"];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::ImplicitLevel),
            1 => Some(Self::Level),
            2 => Some(Self::Temperature),
            _ => None,
        }
    }

    /// Look up a mode by its display name.
    pub fn from_name(name: &str) -> Option<Self> {
        match Self::NAMES.iter().position(|candidate| *candidate == name)? {
            0 => Some(Self::Level),
            _ => Some(Self::Temperature),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::ImplicitLevel => 0,
            Self::Level => 1,
            Self::Temperature => 2,
        }
    }

    pub fn is_power_level(self) -> bool {
        matches!(self, Self::ImplicitLevel | Self::Level)
    }

    pub fn name(self) -> &'static str {
        if self.is_power_level() {
            Self::NAMES[0]
        } else {
            Self::NAMES[1]
        }
    }
}

/// Decoded contents of one inbound telemetry frame.
///
/// Constructed only by [`decode`]; there are no setters. Share it by cloning
/// (the raw bytes are reference counted).
#[derive(Clone, PartialEq)]
pub struct TelemetrySnapshot {
    running_state: u8,
    error_code: u8,
    running_step: u8,
    altitude: u16,
    running_mode: RunningMode,
    set_level: u8,
    set_temperature: Option<u8>,
    supply_decivolts: u16,
    case_temperature: i16,
    cab_temperature: i16,
    raw: Bytes,
}

impl TelemetrySnapshot {
    /// Raw operating state code.
    pub fn running_state(&self) -> u8 {
        self.running_state
    }

    pub fn error_code(&self) -> u8 {
        self.error_code
    }

    /// Fault description, `"Unknown"` for codes outside the table.
    pub fn error_message(&self) -> &'static str {
        FAULT_MESSAGES
            .get(usize::from(self.error_code))
            .copied()
            .unwrap_or(UNKNOWN)
    }

    pub fn running_step(&self) -> u8 {
        self.running_step
    }

    /// Lifecycle phase name, `"Unknown"` for steps outside the table.
    pub fn running_step_message(&self) -> &'static str {
        RUNNING_STEP_MESSAGES
            .get(usize::from(self.running_step))
            .copied()
            .unwrap_or(UNKNOWN)
    }

    /// Altitude in meters.
    pub fn altitude(&self) -> u16 {
        self.altitude
    }

    pub fn running_mode(&self) -> RunningMode {
        self.running_mode
    }

    pub fn set_level(&self) -> u8 {
        self.set_level
    }

    /// Target temperature in °C, only reported in temperature mode.
    pub fn set_temperature(&self) -> Option<u8> {
        self.set_temperature
    }

    /// Supply voltage in volts.
    pub fn supply_voltage(&self) -> f32 {
        f32::from(self.supply_decivolts) / 10.0
    }

    /// Heater body temperature in °C.
    pub fn case_temperature(&self) -> i16 {
        self.case_temperature
    }

    /// Cabin (room) temperature in °C.
    pub fn cab_temperature(&self) -> i16 {
        self.cab_temperature
    }

    /// The frame this snapshot was decoded from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Step message, followed by the fault in parentheses when one is set.
    pub fn status_message(&self) -> String {
        if self.error_code == 0 {
            self.running_step_message().to_string()
        } else {
            format!("{} ({})", self.running_step_message(), self.error_message())
        }
    }
}

impl fmt::Debug for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetrySnapshot")
            .field("running_state", &self.running_state)
            .field("error", &self.error_message())
            .field("running_step", &self.running_step_message())
            .field("running_mode", &self.running_mode)
            .field("set_level", &self.set_level)
            .field("set_temperature", &self.set_temperature)
            .field("supply_voltage", &self.supply_voltage())
            .field("altitude", &self.altitude)
            .field("case_temperature", &self.case_temperature)
            .field("cab_temperature", &self.cab_temperature)
            .finish()
    }
}

/// Decode an inbound telemetry frame.
///
/// Layout (offsets in bytes, multi-byte values little-endian):
/// ```text
///  0      marker 0xAA
///  3      running state
///  4      error code
///  5      running step
///  6..8   altitude (u16)
///  8      running mode (0/1 power level, 2 temperature)
///  9      set level, or set temperature in mode 2
///  10     set level in mode 2
///  11..13 supply voltage in decivolts (u16)
///  13..15 case temperature (i16)
///  15..17 cab temperature (i16)
/// ```
pub fn decode(raw: &[u8]) -> Result<TelemetrySnapshot> {
    if raw.len() < TELEMETRY_FRAME_MIN_LEN {
        return Err(FrameError::MalformedFrame(format!(
            "telemetry frame too short ({} bytes, need {TELEMETRY_FRAME_MIN_LEN})",
            raw.len()
        )));
    }
    if raw[0] != MARKER {
        return Err(FrameError::MalformedFrame(format!(
            "bad marker byte 0x{:02X}",
            raw[0]
        )));
    }

    let mut buf = &raw[3..TELEMETRY_FRAME_MIN_LEN];
    let running_state = buf.get_u8();
    let error_code = buf.get_u8();
    let running_step = buf.get_u8();
    let altitude = buf.get_u16_le();
    let mode_code = buf.get_u8();
    let running_mode = RunningMode::from_code(mode_code)
        .ok_or(FrameError::UnknownMode(mode_code))?;
    let byte9 = buf.get_u8();
    let byte10 = buf.get_u8();
    let (set_level, set_temperature) = match running_mode {
        RunningMode::Temperature => (byte10, Some(byte9)),
        _ => (byte9, None),
    };
    let supply_decivolts = buf.get_u16_le();
    let case_temperature = buf.get_i16_le();
    let cab_temperature = buf.get_i16_le();

    Ok(TelemetrySnapshot {
        running_state,
        error_code,
        running_step,
        altitude,
        running_mode,
        set_level,
        set_temperature,
        supply_decivolts,
        case_temperature,
        cab_temperature,
        raw: Bytes::copy_from_slice(raw),
    })
}

/// Plain field values for building a telemetry frame.
///
/// This is the device side of the protocol: simulators and tests fill these
/// in and call [`TelemetryFields::encode`]. `running_mode` is the raw code so
/// that invalid frames can be produced on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryFields {
    pub running_state: u8,
    pub error_code: u8,
    pub running_step: u8,
    pub altitude: u16,
    pub running_mode: u8,
    pub set_level: u8,
    pub set_temperature: u8,
    pub supply_decivolts: u16,
    pub case_temperature: i16,
    pub cab_temperature: i16,
}

impl Default for TelemetryFields {
    fn default() -> Self {
        Self {
            running_state: 0,
            error_code: 0,
            running_step: 0,
            altitude: 0,
            running_mode: 1,
            set_level: 1,
            set_temperature: 20,
            supply_decivolts: 120,
            case_temperature: 20,
            cab_temperature: 20,
        }
    }
}

impl TelemetryFields {
    /// Encode into a 17-byte telemetry frame.
    pub fn encode(&self) -> Bytes {
        let (byte9, byte10) = if self.running_mode == RunningMode::Temperature.code() {
            (self.set_temperature, self.set_level)
        } else {
            (self.set_level, 0)
        };

        let mut buf = BytesMut::with_capacity(TELEMETRY_FRAME_MIN_LEN);
        buf.put_u8(MARKER);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_u8(self.running_state);
        buf.put_u8(self.error_code);
        buf.put_u8(self.running_step);
        buf.put_u16_le(self.altitude);
        buf.put_u8(self.running_mode);
        buf.put_u8(byte9);
        buf.put_u8(byte10);
        buf.put_u16_le(self.supply_decivolts);
        buf.put_i16_le(self.case_temperature);
        buf.put_i16_le(self.cab_temperature);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: [u8; 17] = [
        0xAA, 0x00, 0x00, 0x03, 0x00, 0x01, 0x05, 0x78, 0x00, 0x14, 0x00, 0xF4, 0x01, 0x32, 0x00,
        0x32, 0x00,
    ];

    #[test]
    fn decode_power_level_scenario() {
        let snapshot = decode(&SCENARIO).unwrap();

        assert_eq!(snapshot.running_state(), 3);
        assert_eq!(snapshot.running_mode(), RunningMode::ImplicitLevel);
        assert_eq!(snapshot.running_mode().code(), 0);
        assert_eq!(snapshot.set_level(), 20);
        assert_eq!(snapshot.set_temperature(), None);
        assert_eq!(snapshot.running_step(), 1);
        assert_eq!(snapshot.running_step_message(), "Self-test");
        assert_eq!(snapshot.error_code(), 0);
        assert_eq!(snapshot.error_message(), "No fault");
        assert_eq!(snapshot.altitude(), 0x7805);
        assert!((snapshot.supply_voltage() - 50.0).abs() < f32::EPSILON);
        assert_eq!(snapshot.case_temperature(), 50);
        assert_eq!(snapshot.cab_temperature(), 50);
        assert_eq!(snapshot.raw(), &SCENARIO);
    }

    #[test]
    fn decode_temperature_mode_swaps_level_and_temperature() {
        let mut raw = SCENARIO;
        raw[8] = 2;
        raw[9] = 22;
        raw[10] = 7;

        let snapshot = decode(&raw).unwrap();
        assert_eq!(snapshot.running_mode(), RunningMode::Temperature);
        assert_eq!(snapshot.set_temperature(), Some(22));
        assert_eq!(snapshot.set_level(), 7);
    }

    #[test]
    fn decode_recovers_negative_temperatures() {
        let mut raw = SCENARIO;
        // -10 °C case, -32768 °C cab (lowest representable)
        raw[13..15].copy_from_slice(&[0xF6, 0xFF]);
        raw[15..17].copy_from_slice(&[0x00, 0x80]);

        let snapshot = decode(&raw).unwrap();
        assert_eq!(snapshot.case_temperature(), -10);
        assert_eq!(snapshot.cab_temperature(), i16::MIN);
    }

    #[test]
    fn decode_keeps_32767_positive() {
        let mut raw = SCENARIO;
        raw[13..15].copy_from_slice(&[0xFF, 0x7F]);
        assert_eq!(decode(&raw).unwrap().case_temperature(), 32767);
    }

    #[test]
    fn decode_rejects_any_other_marker() {
        for marker in (0u8..=255).filter(|b| *b != MARKER) {
            let mut raw = SCENARIO;
            raw[0] = marker;
            assert!(
                matches!(decode(&raw), Err(FrameError::MalformedFrame(_))),
                "marker 0x{marker:02X} must be rejected"
            );
        }
    }

    #[test]
    fn decode_rejects_short_frames() {
        assert!(matches!(
            decode(&SCENARIO[..16]),
            Err(FrameError::MalformedFrame(_))
        ));
        assert!(matches!(decode(&[]), Err(FrameError::MalformedFrame(_))));
    }

    #[test]
    fn decode_accepts_trailing_bytes() {
        let mut raw = SCENARIO.to_vec();
        raw.extend_from_slice(&[0xDE, 0xAD]);
        let snapshot = decode(&raw).unwrap();
        assert_eq!(snapshot.set_level(), 20);
        assert_eq!(snapshot.raw().len(), 19);
    }

    #[test]
    fn decode_rejects_unknown_modes() {
        for mode in 3u8..=255 {
            let mut raw = SCENARIO;
            raw[8] = mode;
            assert_eq!(decode(&raw), Err(FrameError::UnknownMode(mode)));
        }
    }

    #[test]
    fn out_of_table_codes_are_unknown() {
        let mut raw = SCENARIO;
        raw[4] = 11;
        raw[5] = 5;
        let snapshot = decode(&raw).unwrap();
        assert_eq!(snapshot.error_message(), "Unknown");
        assert_eq!(snapshot.running_step_message(), "Unknown");
    }

    #[test]
    fn status_message_appends_fault() {
        let mut raw = SCENARIO;
        raw[4] = 2;
        raw[5] = 3;
        let snapshot = decode(&raw).unwrap();
        assert_eq!(snapshot.status_message(), "Running (Lack of fuel)");
        assert_eq!(decode(&SCENARIO).unwrap().status_message(), "Self-test");
    }

    #[test]
    fn fields_encode_to_decodable_frame() {
        let fields = TelemetryFields {
            running_step: 3,
            running_mode: 2,
            set_level: 5,
            set_temperature: 24,
            supply_decivolts: 131,
            case_temperature: -4,
            ..TelemetryFields::default()
        };
        let snapshot = decode(&fields.encode()).unwrap();

        assert_eq!(snapshot.running_step(), 3);
        assert_eq!(snapshot.set_level(), 5);
        assert_eq!(snapshot.set_temperature(), Some(24));
        assert!((snapshot.supply_voltage() - 13.1).abs() < 1e-4);
        assert_eq!(snapshot.case_temperature(), -4);
    }

    #[test]
    fn mode_names() {
        assert_eq!(
            RunningMode::from_name("Power Level"),
            Some(RunningMode::Level)
        );
        assert_eq!(
            RunningMode::from_name("Temperature"),
            Some(RunningMode::Temperature)
        );
        assert_eq!(RunningMode::from_name("Turbo"), None);
        assert_eq!(RunningMode::ImplicitLevel.name(), "Power Level");
    }
}
