use std::fmt;

use heaterlink_frame::{RunningMode, TelemetrySnapshot};

use crate::topics::{
    DeviceTopics, ALTITUDE, CONTROLS, HEATER_TEMPERATURE, LEVEL, MODE, ROOM_TEMPERATURE, START,
    STATUS, STOP, TEMPERATURE, VOLTAGE,
};

/// Running steps from this one on mean the heater is shutting down.
const COOLDOWN_STEP: u8 = 4;

/// Availability payload for a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Online,
    Offline,
}

impl Availability {
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::Online => "online",
            Availability::Offline => "offline",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One state value, keyed by its control name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    pub control: &'static str,
    pub value: String,
}

/// The full result of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    pub states: Vec<StateUpdate>,
    /// One entry for every control in [`CONTROLS`].
    pub availability: Vec<(&'static str, Availability)>,
}

impl Projection {
    pub fn state(&self, control: &str) -> Option<&str> {
        self.states
            .iter()
            .find(|update| update.control == control)
            .map(|update| update.value.as_str())
    }

    pub fn availability(&self, control: &str) -> Option<Availability> {
        self.availability
            .iter()
            .find(|(name, _)| *name == control)
            .map(|(_, availability)| *availability)
    }
}

/// A rendered topic/payload pair ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: String,
}

/// Derives topic values and availability from telemetry.
#[derive(Debug, Clone)]
pub struct StatePublisher {
    topics: DeviceTopics,
    mode_names: [&'static str; 2],
}

impl StatePublisher {
    pub fn new(topics: DeviceTopics) -> Self {
        Self {
            topics,
            mode_names: RunningMode::NAMES,
        }
    }

    /// Evaluate the visibility rules for one snapshot, or for its absence.
    pub fn project(&self, snapshot: Option<&TelemetrySnapshot>) -> Projection {
        let mut projection = Projection::default();
        let mut online: Vec<&'static str> = Vec::with_capacity(CONTROLS.len());

        if let Some(snapshot) = snapshot {
            let mut state = |control: &'static str, value: String| {
                projection.states.push(StateUpdate { control, value });
            };

            state(STATUS, snapshot.status_message());
            state(ROOM_TEMPERATURE, snapshot.cab_temperature().to_string());

            let mode = snapshot.running_mode();
            if let Some(name) = self.mode_name(mode) {
                state(MODE, name.to_string());
                online.push(MODE);
            }

            let step = snapshot.running_step();
            if step != 0 {
                state(VOLTAGE, format!("{:.1}", snapshot.supply_voltage()));
                state(ALTITUDE, snapshot.altitude().to_string());
                state(HEATER_TEMPERATURE, snapshot.case_temperature().to_string());
                state(LEVEL, snapshot.set_level().to_string());
                if let Some(celsius) = snapshot.set_temperature() {
                    state(TEMPERATURE, celsius.to_string());
                }

                if mode.is_power_level() && step < COOLDOWN_STEP {
                    online.push(LEVEL);
                }
                if mode == RunningMode::Temperature {
                    online.push(TEMPERATURE);
                }
                if step < COOLDOWN_STEP {
                    online.push(STOP);
                }
            } else {
                online.push(START);
            }
        }

        projection.availability = CONTROLS
            .iter()
            .map(|control| {
                let availability = if online.contains(control) {
                    Availability::Online
                } else {
                    Availability::Offline
                };
                (*control, availability)
            })
            .collect();
        projection
    }

    /// Render a projection into topic/payload pairs: states first, then
    /// availability.
    pub fn render(&self, projection: &Projection) -> Vec<OutboundMessage> {
        let states = projection.states.iter().map(|update| OutboundMessage {
            topic: self.topics.state(update.control),
            payload: update.value.clone(),
        });
        let availability = projection
            .availability
            .iter()
            .map(|(control, availability)| OutboundMessage {
                topic: self.topics.availability(control),
                payload: availability.as_str().to_string(),
            });
        states.chain(availability).collect()
    }

    /// `project` followed by `render`.
    pub fn publish(&self, snapshot: Option<&TelemetrySnapshot>) -> Vec<OutboundMessage> {
        self.render(&self.project(snapshot))
    }

    // Mode 0 is reported while no mode has been chosen and is not published.
    fn mode_name(&self, mode: RunningMode) -> Option<&'static str> {
        match mode.code() {
            0 => None,
            code => self.mode_names.get(usize::from(code) - 1).copied(),
        }
    }
}
