//! Bridge between a heater link and a publish/subscribe broker.
//!
//! [`PollLoop`] is the single control loop: it polls the link on a fixed
//! interval, executes commands as they arrive, and hands every result to a
//! [`StateSink`]. The [`mqtt`] module provides the broker side.

pub mod error;
pub mod intake;
pub mod mqtt;
pub mod poll;
pub mod shutdown;
pub mod sink;

pub use error::{BridgeError, Result};
pub use intake::parse_command;
pub use mqtt::{MqttConfig, MqttSession, MqttSink};
pub use poll::{PollConfig, PollLoop};
pub use shutdown::ShutdownToken;
pub use sink::StateSink;
