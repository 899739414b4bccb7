//! Error types for event callbacks

/// Failure reported by a subscriber callback
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Callback failed: {0}")]
    Callback(String),

    #[error("Callback panicked: {0}")]
    Panicked(String),
}

/// Result type alias for event callbacks
pub type Result<T> = std::result::Result<T, EventError>;

impl EventError {
    pub fn callback<S: Into<String>>(msg: S) -> Self {
        EventError::Callback(msg.into())
    }
}
