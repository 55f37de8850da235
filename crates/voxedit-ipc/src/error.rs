//! IPC error type.

use thiserror::Error;

/// Errors raised by the recognizer connection.
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("IPC service is already running in this process")]
    /// A second service was started while one is live.
    AlreadyRunning,

    #[error("recognizer unreachable after {attempts} connection attempts")]
    /// Every reconnect attempt failed.
    Unreachable {
        /// Connection attempts made before giving up.
        attempts: u32,
    },

    #[error("I/O error: {0}")]
    /// Socket failure.
    Io(#[from] std::io::Error),

    #[error("invalid JSON message: {0}")]
    /// A message body was not valid JSON.
    Json(#[from] serde_json::Error),

    #[error("invalid message framing: {0}")]
    /// Headers were missing or malformed.
    Framing(String),

    #[error("IPC service stopped")]
    /// The service task is gone.
    Closed,
}
