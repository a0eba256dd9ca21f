//! LLM provider abstraction layer for chartwatch
//!
//! This crate provides provider-agnostic abstractions for sending chart
//! screenshots to Large Language Models and collecting their text replies.
//! It includes:
//!
//! - Message types with multi-modal (text + image) content
//! - Completion request/response types
//! - Provider trait for LLM implementations
//! - Retry with exponential backoff and jitter for rate-limited calls
//! - Concrete provider implementations (behind the `providers` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod retry;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, ImageSource, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use retry::RetryPolicy;

// Provider implementations (feature-gated)
#[cfg(feature = "providers")]
pub mod providers;
