//! Concrete LLM provider implementations

pub mod anthropic;
pub mod gemini;
pub mod openai_compat;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai_compat::{OpenAiCompatConfig, OpenAiCompatProvider};
