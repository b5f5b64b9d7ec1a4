/// Errors that can occur while decoding heater frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame is too short or does not start with the 0xAA marker.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The running mode byte is not one of the known modes (0, 1, 2).
    #[error("unknown running mode {0}")]
    UnknownMode(u8),

    /// A parsed command frame carries a checksum that does not match its contents.
    #[error("checksum mismatch (expected 0x{expected:02X}, found 0x{found:02X})")]
    ChecksumMismatch { expected: u8, found: u8 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
