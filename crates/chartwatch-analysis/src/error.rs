//! Error types for analysis operations

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur in the analysis pipeline
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No provider is enabled and configured
    #[error("no AI providers enabled or properly configured")]
    NoProviders,

    /// No screenshot survived capture
    #[error("no valid screenshots found for analysis")]
    NoScreenshots,

    /// Underlying LLM call failed
    #[error("LLM error: {0}")]
    Llm(#[from] chartwatch_llm::LLMError),

    /// Prompt rendering failed
    #[error("prompt error: {0}")]
    Prompt(#[from] chartwatch_prompt::PromptError),

    /// Screenshot could not be encoded
    #[error("encode error: {0}")]
    Encode(#[from] chartwatch_utils::EncodeError),

    /// Report template failed to render
    #[error("report render failed: {0}")]
    Template(#[from] minijinja::Error),

    /// Report file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
