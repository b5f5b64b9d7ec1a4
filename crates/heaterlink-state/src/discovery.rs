//! Home Assistant MQTT discovery documents.
//!
//! Each entity gets one retained JSON document under
//! `<discovery_prefix>/<component>/<device_id>/<object>/config`.

use heaterlink_frame::RunningMode;
use serde::Serialize;

use crate::publisher::{Availability, OutboundMessage};
use crate::topics::{
    DeviceTopics, ALTITUDE, HEATER_TEMPERATURE, LEVEL, MODE, ROOM_TEMPERATURE, START, STATUS, STOP,
    TEMPERATURE, VOLTAGE,
};

/// Device block shared by every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub identifiers: String,
    pub manufacturer: String,
    pub model: String,
    pub via_device: String,
    pub sw_version: String,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Button,
    Sensor {
        unit: Option<&'static str>,
        device_class: Option<&'static str>,
    },
    Number {
        min: i64,
        max: i64,
        unit: Option<&'static str>,
    },
    Select,
}

impl Kind {
    fn component(self) -> &'static str {
        match self {
            Kind::Button => "button",
            Kind::Sensor { .. } => "sensor",
            Kind::Number { .. } => "number",
            Kind::Select => "select",
        }
    }
}

struct Entity {
    control: &'static str,
    name: &'static str,
    icon: &'static str,
    kind: Kind,
    has_availability: bool,
}

static ENTITIES: [Entity; 10] = [
    Entity {
        control: START,
        name: "Start",
        icon: "mdi:play",
        kind: Kind::Button,
        has_availability: true,
    },
    Entity {
        control: STOP,
        name: "Stop",
        icon: "mdi:stop",
        kind: Kind::Button,
        has_availability: true,
    },
    Entity {
        control: STATUS,
        name: "Status",
        icon: "mdi:information-outline",
        kind: Kind::Sensor {
            unit: None,
            device_class: None,
        },
        has_availability: false,
    },
    Entity {
        control: ROOM_TEMPERATURE,
        name: "Room temperature",
        icon: "mdi:home-thermometer",
        kind: Kind::Sensor {
            unit: Some("°C"),
            device_class: Some("temperature"),
        },
        has_availability: false,
    },
    Entity {
        control: HEATER_TEMPERATURE,
        name: "Heater temperature",
        icon: "mdi:thermometer-high",
        kind: Kind::Sensor {
            unit: Some("°C"),
            device_class: Some("temperature"),
        },
        has_availability: false,
    },
    Entity {
        control: VOLTAGE,
        name: "Supply voltage",
        icon: "mdi:car-battery",
        kind: Kind::Sensor {
            unit: Some("V"),
            device_class: Some("voltage"),
        },
        has_availability: false,
    },
    Entity {
        control: ALTITUDE,
        name: "Altitude",
        icon: "mdi:image-filter-hdr",
        kind: Kind::Sensor {
            unit: Some("m"),
            device_class: Some("distance"),
        },
        has_availability: false,
    },
    Entity {
        control: LEVEL,
        name: "Level",
        icon: "mdi:fire",
        kind: Kind::Number {
            min: 1,
            max: 36,
            unit: None,
        },
        has_availability: true,
    },
    Entity {
        control: TEMPERATURE,
        name: "Temperature",
        icon: "mdi:thermometer",
        kind: Kind::Number {
            min: 8,
            max: 36,
            unit: Some("°C"),
        },
        has_availability: true,
    },
    Entity {
        control: MODE,
        name: "Mode",
        icon: "mdi:cog",
        kind: Kind::Select,
        has_availability: true,
    },
];

static MODE_OPTIONS: [&str; 2] = RunningMode::NAMES;

#[derive(Serialize)]
struct EntityConfig<'a> {
    name: &'a str,
    unique_id: String,
    object_id: String,
    icon: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    availability_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_available: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_not_available: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a [&'a str]>,
    device: &'a DeviceInfo,
}

/// Build the retained discovery documents for every entity.
pub fn discovery_messages(
    discovery_prefix: &str,
    topics: &DeviceTopics,
    device: &DeviceInfo,
) -> Vec<OutboundMessage> {
    let prefix = discovery_prefix.trim_end_matches('/');
    ENTITIES
        .iter()
        .map(|entity| {
            let object_id = format!("{}_{}", device.identifiers, entity.control);
            let config = entity_config(entity, object_id.clone(), topics, device);
            OutboundMessage {
                topic: format!(
                    "{prefix}/{}/{}/{}/config",
                    entity.kind.component(),
                    device.identifiers,
                    entity.control
                ),
                payload: serde_json::to_string(&config)
                    .unwrap_or_else(|_| "{}".to_string()),
            }
        })
        .collect()
}

fn entity_config<'a>(
    entity: &'a Entity,
    object_id: String,
    topics: &DeviceTopics,
    device: &'a DeviceInfo,
) -> EntityConfig<'a> {
    let (state_topic, command_topic) = match entity.kind {
        Kind::Button => (None, Some(topics.command(entity.control))),
        Kind::Sensor { .. } => (Some(topics.state(entity.control)), None),
        Kind::Number { .. } | Kind::Select => (
            Some(topics.state(entity.control)),
            Some(topics.command(entity.control)),
        ),
    };
    let (unit, device_class, min, max) = match entity.kind {
        Kind::Sensor { unit, device_class } => (unit, device_class, None, None),
        Kind::Number { min, max, unit } => (unit, None, Some(min), Some(max)),
        Kind::Button | Kind::Select => (None, None, None, None),
    };
    let available = entity.has_availability;

    EntityConfig {
        name: entity.name,
        unique_id: object_id.clone(),
        object_id,
        icon: entity.icon,
        state_topic,
        command_topic,
        availability_topic: available.then(|| topics.availability(entity.control)),
        payload_available: available.then_some(Availability::Online.as_str()),
        payload_not_available: available.then_some(Availability::Offline.as_str()),
        unit_of_measurement: unit,
        device_class,
        min,
        max,
        options: matches!(entity.kind, Kind::Select).then_some(&MODE_OPTIONS[..]),
        device,
    }
}
