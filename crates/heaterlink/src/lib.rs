//! Diesel heater link protocol and MQTT bridge.
//!
//! # Crate Structure
//!
//! - [`frame`]: command frame encoding and telemetry decoding
//! - [`transport`]: link transport trait, notification channel, simulator
//! - [`link`]: serialized command/poll access to one heater
//! - [`state`]: topic and availability projection, discovery documents (behind `bridge`)
//! - [`bridge`]: poll loop and MQTT adapter (behind `bridge`)

/// Re-export frame types.
pub mod frame {
    pub use heaterlink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use heaterlink_transport::*;
}

/// Re-export link types.
pub mod link {
    pub use heaterlink_link::*;
}

/// Re-export state projection types (requires `bridge` feature).
#[cfg(feature = "bridge")]
pub mod state {
    pub use heaterlink_state::*;
}

/// Re-export bridge types (requires `bridge` feature).
#[cfg(feature = "bridge")]
pub mod bridge {
    pub use heaterlink_bridge::*;
}
