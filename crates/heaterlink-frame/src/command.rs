//! Known command codes.
//!
//! The argument meaning depends on the command; see each constant.

/// Status query. Argument is ignored (sent as 0).
pub const STATUS: u8 = 1;

/// Select running mode. Argument 1 = power level, 2 = temperature.
pub const SET_MODE: u8 = 2;

/// Start or stop the heater. Argument 1 = start, 0 = stop.
pub const START_STOP: u8 = 3;

/// Set power level (1-36) or, in temperature mode, the target temperature.
pub const SET_LEVEL: u8 = 4;

/// Returns a human-readable name for a command code.
pub fn command_name(code: u8) -> &'static str {
    match code {
        STATUS => "status",
        SET_MODE => "set-mode",
        START_STOP => "start-stop",
        SET_LEVEL => "set-level",
        _ => "unknown",
    }
}
