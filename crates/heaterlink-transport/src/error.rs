/// Errors that can occur in link transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device refused a write or read.
    #[error("device rejected request: {0}")]
    Rejected(String),

    /// The link is gone and will not come back without reconnecting.
    #[error("link disconnected")]
    Disconnected,
}

impl TransportError {
    /// Whether the error means the link itself is lost.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, TransportError::Disconnected)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
