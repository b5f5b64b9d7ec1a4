use heaterlink_link::LinkError;

/// Errors that can occur in the bridge layer.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The heater link failed; only [`LinkError::Disconnected`] ends a loop.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The broker could not be reached at startup.
    #[error("broker {endpoint} unreachable: {reason}")]
    Connect { endpoint: String, reason: String },

    /// The MQTT client refused a request because its queue is full or closed.
    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// An inbound message arrived on a topic this device does not handle.
    #[error("no command on topic {0}")]
    UnknownTopic(String),

    /// An inbound command payload could not be interpreted.
    #[error("invalid {control} payload {payload:?}")]
    InvalidPayload {
        control: &'static str,
        payload: String,
    },
}

impl BridgeError {
    /// Whether the bridge must stop.
    pub fn is_fatal(&self) -> bool {
        match self {
            BridgeError::Link(err) => err.is_fatal(),
            BridgeError::Connect { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
