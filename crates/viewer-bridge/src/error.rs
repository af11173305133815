use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Transport unavailable: no post-message executor registered")]
    TransportUnavailable,

    #[error("Condition not met")]
    ConditionNotMet,

    #[error("Viewer rejected action: {0}")]
    RemoteRejected(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid payload for {action}: {reason}")]
    InvalidPayload { action: String, reason: String },

    #[error("postMessage failed: {0}")]
    PostMessageFailed(String),

    #[error("Popup blocked: the external viewer window could not be opened")]
    PopupBlocked,

    #[error("No response for action {id} within {timeout_ms}ms")]
    ResponseTimeout { id: String, timeout_ms: u64 },

    #[error("Action cancelled before it was executed")]
    Cancelled,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
