//! Serialized access to a heater link.
//!
//! The link has exactly one response path and responses carry no request ID,
//! so commands and status polls must never overlap. [`LinkChannel`] owns the
//! transport and the notification receiver behind one lock and runs each
//! request as "clear, act, wait, capture" while holding it.

pub mod channel;
pub mod control;
pub mod error;

pub use channel::{LinkChannel, LinkConfig};
pub use control::{HeaterCommand, LEVEL_RANGE, MODE_RANGE, TEMPERATURE_RANGE};
pub use error::{LinkError, Result};
