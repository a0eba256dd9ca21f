//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Service temporarily overloaded (HTTP 503 and friends)
    #[error("Service overloaded: {0}")]
    Overloaded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(feature = "providers")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Whether a retry with backoff may succeed
    ///
    /// Rate limits, overload responses, and transport failures are
    /// transient; everything else (bad key, bad request, bad model) is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::Overloaded(_) => true,
            #[cfg(feature = "providers")]
            Self::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Map an HTTP status code and error body to the matching variant
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed,
            429 => Self::RateLimitExceeded(body),
            400 => Self::InvalidRequest(body),
            404 => Self::ModelNotFound(model.to_string()),
            503 | 529 => Self::Overloaded(body),
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            LLMError::from_status(401, String::new(), "m"),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            LLMError::from_status(429, "quota".to_string(), "m"),
            LLMError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            LLMError::from_status(404, String::new(), "sonar-pro"),
            LLMError::ModelNotFound(m) if m == "sonar-pro"
        ));
        assert!(matches!(
            LLMError::from_status(503, String::new(), "m"),
            LLMError::Overloaded(_)
        ));
        assert!(matches!(
            LLMError::from_status(500, String::new(), "m"),
            LLMError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LLMError::RateLimitExceeded("429".to_string()).is_retryable());
        assert!(LLMError::Overloaded("503".to_string()).is_retryable());
        assert!(!LLMError::AuthenticationFailed.is_retryable());
        assert!(!LLMError::InvalidRequest("bad".to_string()).is_retryable());
        assert!(!LLMError::ModelNotFound("m".to_string()).is_retryable());
    }
}
