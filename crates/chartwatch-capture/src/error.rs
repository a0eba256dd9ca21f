//! Error types for capture operations

use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors that can occur while driving the screen
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No visible window matched the title keyword
    #[error("window not found: {0}")]
    WindowNotFound(String),

    /// Input synthesis or screen capture failed in the backend
    #[error("driver error: {0}")]
    Driver(String),

    /// Screenshot could not be written
    #[error("failed to save screenshot {path}: {reason}")]
    Save { path: String, reason: String },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}
