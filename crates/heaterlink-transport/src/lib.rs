//! Link transport abstraction.
//!
//! A heater link offers three things: a writable control resource, a readable
//! status resource, and an asynchronous stream of notifications. Hardware
//! adapters implement [`HeaterTransport`] for the first two and push
//! notifications through a [`NotificationSender`].
//!
//! This crate also ships [`SimulatedHeater`], a device-side implementation of
//! the protocol used for local runs and tests.

pub mod error;
pub mod notify;
pub mod sim;
pub mod traits;

pub use error::{Result, TransportError};
pub use notify::{notification_channel, NotificationReceiver, NotificationSender};
pub use sim::SimulatedHeater;
pub use traits::HeaterTransport;
