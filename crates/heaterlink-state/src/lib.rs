//! Projection of heater telemetry onto messaging topics.
//!
//! [`StatePublisher`] turns the latest [`TelemetrySnapshot`] (or its absence)
//! into state values and per-control availability. Every evaluation reports
//! availability for every control, so nothing is left stale from a previous
//! cycle.
//!
//! [`discovery`] builds the retained Home Assistant configuration documents
//! announcing those topics.
//!
//! [`TelemetrySnapshot`]: heaterlink_frame::TelemetrySnapshot

pub mod discovery;
pub mod publisher;
pub mod topics;

pub use discovery::{discovery_messages, DeviceInfo};
pub use publisher::{Availability, OutboundMessage, Projection, StatePublisher, StateUpdate};
pub use topics::{device_id, DeviceTopics, CONTROLS};
