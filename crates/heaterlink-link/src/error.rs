use std::ops::RangeInclusive;

/// Errors that can occur in link operations.
///
/// A device that simply does not answer is not an error; see
/// [`LinkChannel::send_command`](crate::LinkChannel::send_command).
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// A command argument is out of range. Nothing was transmitted.
    #[error("invalid {what} {value} (expected {}..={})", .range.start(), .range.end())]
    InvalidArgument {
        what: &'static str,
        value: i64,
        range: RangeInclusive<i64>,
    },

    /// The device answered with a frame that could not be decoded.
    #[error("frame error: {0}")]
    Frame(#[from] heaterlink_frame::FrameError),

    /// The transport reports the link is gone.
    #[error("link to {endpoint} disconnected")]
    Disconnected { endpoint: String },
}

impl LinkError {
    /// Whether the caller should stop using this link.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::Disconnected { .. })
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
