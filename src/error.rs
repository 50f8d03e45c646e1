use crate::types::InitState;
use thiserror::Error;

/// Result type for host mixer operations
pub type Result<T> = std::result::Result<T, MixerError>;

/// Errors raised by a host mixer backend
#[derive(Error, Debug)]
pub enum MixerError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection was closed unexpectedly
    #[error("Connection closed")]
    ConnectionClosed,

    /// Request timed out waiting for response
    #[error("Request timeout")]
    Timeout,

    /// Mixer service returned an error response
    #[error("Mixer service error: {detail}")]
    ApiError {
        /// Error detail message from the service
        detail: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unexpected response from the service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No parameter with this id exists in the parameter web
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A value read from a control is not usable
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The backend refused the operation
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by [`VolumeControl`](crate::VolumeControl) operations
#[derive(Error, Debug)]
pub enum VolumeError {
    /// Discovery did not complete, so no control can be touched
    #[error("Mixer control not initialized: {0}")]
    NotInitialized(InitState),

    /// Reading a control failed
    #[error("Couldn't read from mixer: {0}")]
    Read(#[source] MixerError),

    /// Writing a control failed
    #[error("Couldn't write to mixer: {0}")]
    Write(#[source] MixerError),

    /// The requested volume is not a number
    #[error("Volume is not a number: {0}")]
    InvalidValue(f64),
}

/// Errors raised while delivering a desktop notification
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Session bus or notification service failure
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    /// The notification timeout does not fit the service's millisecond field
    #[error("Notification timeout out of range: {0:?}")]
    Timeout(std::time::Duration),
}
