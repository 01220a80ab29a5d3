//! Error types shared across Tracelock crates.

/// Top-level error type for Tracelock operations.
#[derive(Debug, thiserror::Error)]
pub enum TracelockError {
    #[error("Frame error: {message}")]
    Frame { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using TracelockError.
pub type TracelockResult<T> = Result<T, TracelockError>;

impl TracelockError {
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
