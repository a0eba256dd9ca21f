//! Error types for prompt rendering

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur while rendering a prompt
#[derive(Debug, Error)]
pub enum PromptError {
    /// Template failed to parse or render
    #[error("template render failed: {0}")]
    Render(#[from] minijinja::Error),
}
