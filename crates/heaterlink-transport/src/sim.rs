use bytes::Bytes;
use heaterlink_frame::{
    command_name, CommandFrame, Passkey, RunningMode, TelemetryFields, SET_LEVEL, SET_MODE,
    START_STOP, STATUS,
};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::notify::NotificationSender;
use crate::traits::HeaterTransport;

const STEP_STANDBY: u8 = 0;
const STEP_SELF_TEST: u8 = 1;
const STEP_IGNITION: u8 = 2;
const STEP_RUNNING: u8 = 3;
const STEP_COOLDOWN: u8 = 4;

const LEVEL_RANGE: std::ops::RangeInclusive<u16> = 1..=36;
const TEMPERATURE_RANGE: std::ops::RangeInclusive<u16> = 8..=36;

const CASE_TEMPERATURE_MAX: i16 = 160;
const CASE_TEMPERATURE_STEP: i16 = 15;

/// An in-process heater speaking the device side of the protocol.
///
/// Every accepted command frame produces one telemetry notification. Frames
/// with the wrong passkey are dropped silently, like real units do, so the
/// caller sees a missing confirmation. The lifecycle advances one phase per
/// interaction: Self-test → Ignition → Running, and Cooldown → Standby.
pub struct SimulatedHeater {
    name: String,
    passkey: Passkey,
    state: TelemetryFields,
    notifications: NotificationSender,
}

impl SimulatedHeater {
    /// Create a simulator in standby, power-level mode, level 1.
    pub fn new(passkey: Passkey, notifications: NotificationSender) -> Self {
        Self {
            name: "simulated-heater".to_string(),
            passkey,
            state: TelemetryFields::default(),
            notifications,
        }
    }

    /// Override the endpoint name reported for diagnostics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the initial device state.
    pub fn with_state(mut self, state: TelemetryFields) -> Self {
        self.state = state;
        self
    }

    /// Current device state.
    pub fn state(&self) -> &TelemetryFields {
        &self.state
    }

    /// Push the current state as an unsolicited notification.
    pub fn notify(&self) {
        self.notifications.deliver(self.state.encode());
    }

    fn apply(&mut self, frame: &CommandFrame) {
        let argument = frame.argument();
        match frame.command() {
            STATUS => {}
            SET_MODE => match RunningMode::from_code(argument.min(255) as u8) {
                Some(mode @ (RunningMode::Level | RunningMode::Temperature)) => {
                    self.state.running_mode = mode.code();
                }
                _ => warn!(argument, "simulator ignoring invalid mode"),
            },
            START_STOP => match (argument, self.state.running_step) {
                (1, STEP_STANDBY | STEP_COOLDOWN) => {
                    info!("simulated heater starting");
                    self.state.running_state = 1;
                    self.state.running_step = STEP_SELF_TEST;
                }
                (0, STEP_SELF_TEST..=STEP_RUNNING) => {
                    info!("simulated heater stopping");
                    self.state.running_step = STEP_COOLDOWN;
                }
                _ => debug!(
                    argument,
                    step = self.state.running_step,
                    "start/stop has no effect"
                ),
            },
            SET_LEVEL => {
                if self.state.running_mode == RunningMode::Temperature.code() {
                    if TEMPERATURE_RANGE.contains(&argument) {
                        self.state.set_temperature = argument as u8;
                    }
                } else if LEVEL_RANGE.contains(&argument) {
                    self.state.set_level = argument as u8;
                }
            }
            other => warn!(command = other, "simulator ignoring unknown command"),
        }
    }

    fn advance(&mut self) {
        let state = &mut self.state;
        match state.running_step {
            STEP_SELF_TEST => state.running_step = STEP_IGNITION,
            STEP_IGNITION => state.running_step = STEP_RUNNING,
            STEP_COOLDOWN => {
                state.running_step = STEP_STANDBY;
                state.running_state = 0;
            }
            _ => {}
        }

        state.case_temperature = if matches!(state.running_step, STEP_IGNITION | STEP_RUNNING) {
            (state.case_temperature + CASE_TEMPERATURE_STEP).min(CASE_TEMPERATURE_MAX)
        } else {
            (state.case_temperature - CASE_TEMPERATURE_STEP).max(state.cab_temperature)
        };
    }
}

impl HeaterTransport for SimulatedHeater {
    fn write_command(&mut self, frame: &[u8]) -> Result<()> {
        let frame = CommandFrame::parse(frame)
            .map_err(|err| TransportError::Rejected(err.to_string()))?;

        if !frame.is_pairing() && !frame.authenticates(self.passkey) {
            warn!(
                command = command_name(frame.command()),
                "simulator dropping frame with wrong passkey"
            );
            return Ok(());
        }

        debug!(
            command = command_name(frame.command()),
            argument = frame.argument(),
            "simulator received command"
        );
        self.apply(&frame);
        self.advance();
        self.notify();
        Ok(())
    }

    fn read_status(&mut self) -> Result<Bytes> {
        self.advance();
        Ok(self.state.encode())
    }

    fn endpoint(&self) -> &str {
        &self.name
    }
}
