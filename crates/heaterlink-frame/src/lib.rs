//! Command and telemetry frame codec for BLE diesel heaters.
//!
//! This is the lowest layer of heaterlink. It has no I/O and no state:
//! - Outbound commands are fixed 8-byte frames carrying a marker byte, an
//!   auth variant, two auth bytes, a command code, a 16-bit argument and a
//!   modulo-256 checksum.
//! - Inbound telemetry frames are at least 17 bytes of positional fields whose
//!   layout depends on the running mode.
//!
//! Everything above this crate only ever sees [`CommandFrame`] and
//! [`TelemetrySnapshot`] values.

pub mod codec;
pub mod command;
pub mod error;
pub mod telemetry;

pub use codec::{
    checksum, encode, Auth, CommandFrame, Passkey, COMMAND_FRAME_LEN, MARKER, VARIANT_NORMAL,
    VARIANT_PAIRING,
};
pub use command::{command_name, SET_LEVEL, SET_MODE, START_STOP, STATUS};
pub use error::{FrameError, Result};
pub use telemetry::{
    decode, RunningMode, TelemetryFields, TelemetrySnapshot, FAULT_MESSAGES,
    RUNNING_STEP_MESSAGES, TELEMETRY_FRAME_MIN_LEN,
};
