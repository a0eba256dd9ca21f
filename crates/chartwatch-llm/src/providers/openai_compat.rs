//! OpenAI-compatible provider implementation
//!
//! One adapter serves every vendor speaking the OpenAI chat-completions
//! dialect: OpenAI itself, Perplexity (`https://api.perplexity.ai`), and
//! Grok (`https://api.x.ai/v1`). The vendor is selected through the config's
//! `api_base`; presets exist for the three the capture pipeline uses.
//!
//! # Examples
//!
//! ```no_run
//! use chartwatch_llm::{CompletionRequest, LLMProvider, Message};
//! use chartwatch_llm::providers::{OpenAiCompatConfig, OpenAiCompatProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Perplexity preset from PERPLEXITY_API_KEY
//!     let provider = OpenAiCompatProvider::perplexity_from_env()?;
//!
//!     let request = CompletionRequest::builder("sonar-pro")
//!         .add_message(Message::user("Summarize the trend in one line"))
//!         .max_tokens(200)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMProvider, Message, MessageContent,
    Result, Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const PERPLEXITY_API_BASE: &str = "https://api.perplexity.ai";
const GROK_API_BASE: &str = "https://api.x.ai/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Provider name reported by [`LLMProvider::name`]
    pub name: &'static str,

    /// API key for authentication
    pub api_key: String,

    /// Base URL of the chat-completions endpoint
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Optional list of supported models
    /// If None, any model string is accepted
    pub supported_models: Option<Vec<String>>,
}

impl OpenAiCompatConfig {
    /// OpenAI preset
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::custom("openai", api_key, OPENAI_API_BASE)
    }

    /// Perplexity preset
    pub fn perplexity(api_key: impl Into<String>) -> Self {
        Self::custom("perplexity", api_key, PERPLEXITY_API_BASE)
    }

    /// Grok preset
    pub fn grok(api_key: impl Into<String>) -> Self {
        Self::custom("grok", api_key, GROK_API_BASE)
    }

    /// Arbitrary OpenAI-compatible endpoint (Azure, local deployments, ...)
    pub fn custom(
        name: &'static str,
        api_key: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            name,
            api_key: api_key.into(),
            api_base: api_base.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            supported_models: None,
        }
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set supported models list
    ///
    /// When set, the provider validates model names against this list.
    pub fn with_supported_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = Some(models);
        self
    }
}

/// OpenAI-compatible provider
///
/// Known quirk handled here: models whose name contains `gpt-5` reject
/// `max_tokens` and require `max_completion_tokens` instead.
pub struct OpenAiCompatProvider {
    client: Client,
    config: OpenAiCompatConfig,
}

impl OpenAiCompatProvider {
    /// Create a provider with the given configuration
    pub fn with_config(config: OpenAiCompatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// OpenAI provider from `OPENAI_API_KEY`
    pub fn openai_from_env() -> Result<Self> {
        Self::with_config(OpenAiCompatConfig::openai(env_key("OPENAI_API_KEY")?))
    }

    /// Perplexity provider from `PERPLEXITY_API_KEY`
    pub fn perplexity_from_env() -> Result<Self> {
        Self::with_config(OpenAiCompatConfig::perplexity(env_key(
            "PERPLEXITY_API_KEY",
        )?))
    }

    /// Grok provider from `GROK_API_KEY`
    pub fn grok_from_env() -> Result<Self> {
        Self::with_config(OpenAiCompatConfig::grok(env_key("GROK_API_KEY")?))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAiCompatConfig {
        &self.config
    }

    /// Validate model name against supported models list (if configured)
    fn validate_model(&self, model: &str) -> Result<()> {
        if let Some(supported) = &self.config.supported_models {
            if !supported.iter().any(|m| m == model) {
                return Err(crate::LLMError::InvalidRequest(format!(
                    "Model '{model}' is not in the supported models list: {supported:?}"
                )));
            }
        }
        Ok(())
    }
}

fn env_key(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| {
        crate::LLMError::ConfigurationError(format!("{var} environment variable not set"))
    })
}

#[async_trait]
impl LLMProvider for OpenAiCompatProvider {
    #[instrument(skip(self, request), fields(provider = %self.config.name, model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to {}", self.config.api_base);

        self.validate_model(&request.model)?;

        // gpt-5 family uses max_completion_tokens instead of max_tokens
        let (max_tokens, max_completion_tokens) = if request.model.to_lowercase().contains("gpt-5")
        {
            (None, Some(request.max_tokens))
        } else {
            (Some(request.max_tokens), None)
        };

        let wire_request = WireRequest {
            model: request.model.clone(),
            messages: build_wire_messages(request.system.clone(), &request.messages),
            max_tokens,
            max_completion_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&wire_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            return Err(crate::LLMError::from_status(
                status,
                error_text,
                &request.model,
            ));
        }

        let wire_response: WireResponse = response.json().await.map_err(|e| {
            crate::LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let choice = wire_response.choices.into_iter().next().ok_or_else(|| {
            crate::LLMError::UnexpectedResponse("No choices in response".to_string())
        })?;

        let usage = wire_response.usage.unwrap_or_default();
        debug!(
            "Received response - finish_reason: {}, tokens: {}/{}",
            choice.finish_reason, usage.prompt_tokens, usage.completion_tokens
        );

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            stop_reason: map_stop_reason(&choice.finish_reason),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &str {
        self.config.name
    }
}

// ============================================================================
// Wire types (chat-completions dialect)
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    ImageUrl { image_url: WireImageUrl },
}

#[derive(Debug, Serialize)]
struct WireImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    finish_reason: String,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// Build wire messages from our generic format
///
/// System prompts go into the messages array for this dialect.
fn build_wire_messages(system: Option<String>, messages: &[Message]) -> Vec<WireMessage> {
    let mut result = Vec::new();

    if let Some(sys) = system {
        result.push(WireMessage {
            role: "system",
            content: WireContent::Text(sys),
        });
    }

    for msg in messages {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };

        let content = match &msg.content {
            MessageContent::Text(text) => WireContent::Text(text.clone()),
            MessageContent::Blocks(blocks) => WireContent::Parts(
                blocks
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => WirePart::Text { text: text.clone() },
                        ContentBlock::Image { source } => WirePart::ImageUrl {
                            image_url: WireImageUrl {
                                url: source.to_url(),
                            },
                        },
                    })
                    .collect(),
            ),
        };

        result.push(WireMessage { role, content });
    }

    result
}

/// Map a finish reason to our format
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "length" => StopReason::MaxTokens,
        "stop" | "content_filter" => StopReason::EndTurn,
        other => {
            debug!("Unknown finish reason: {}", other);
            StopReason::EndTurn
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageSource;

    #[test]
    fn test_presets() {
        let openai = OpenAiCompatConfig::openai("k");
        assert_eq!(openai.name, "openai");
        assert_eq!(openai.api_base, "https://api.openai.com/v1");

        let perplexity = OpenAiCompatConfig::perplexity("k");
        assert_eq!(perplexity.name, "perplexity");
        assert_eq!(perplexity.api_base, "https://api.perplexity.ai");

        let grok = OpenAiCompatConfig::grok("k");
        assert_eq!(grok.name, "grok");
        assert_eq!(grok.api_base, "https://api.x.ai/v1");
    }

    #[test]
    fn test_provider_creation() {
        let provider =
            OpenAiCompatProvider::with_config(OpenAiCompatConfig::perplexity("test-key")).unwrap();
        assert_eq!(provider.name(), "perplexity");
        assert_eq!(provider.config().timeout_secs, 120);
    }

    #[test]
    fn test_model_validation() {
        let config = OpenAiCompatConfig::openai("test-key")
            .with_supported_models(vec!["gpt-4o".to_string()]);
        let provider = OpenAiCompatProvider::with_config(config).unwrap();

        assert!(provider.validate_model("gpt-4o").is_ok());
        assert!(provider.validate_model("sonar-pro").is_err());
    }

    #[test]
    fn test_no_validation_when_not_configured() {
        let provider =
            OpenAiCompatProvider::with_config(OpenAiCompatConfig::grok("test-key")).unwrap();
        assert!(provider.validate_model("anything").is_ok());
    }

    #[test]
    fn test_system_message_in_array() {
        let messages = build_wire_messages(Some("You are an analyst".to_string()), &[]);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "system");
        match &messages[0].content {
            WireContent::Text(text) => assert_eq!(text, "You are an analyst"),
            WireContent::Parts(_) => panic!("Expected text content"),
        }
    }

    #[test]
    fn test_image_message_conversion() {
        let msg = Message::user_with_images(
            "What do these charts show?",
            vec![ImageSource::Base64 {
                media_type: "image/png".to_string(),
                data: "abc123".to_string(),
            }],
        );
        let wire = build_wire_messages(None, &[msg]);

        assert_eq!(wire.len(), 1);
        match &wire[0].content {
            WireContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0], WirePart::Text { .. }));
                match &parts[1] {
                    WirePart::ImageUrl { image_url } => {
                        assert_eq!(image_url.url, "data:image/png;base64,abc123");
                    }
                    WirePart::Text { .. } => panic!("Expected image part"),
                }
            }
            WireContent::Text(_) => panic!("Expected multi-part content"),
        }
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("content_filter"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("unknown"), StopReason::EndTurn);
    }

    #[test]
    fn test_gpt5_token_field() {
        // The request body must carry max_completion_tokens for gpt-5 models
        let request = WireRequest {
            model: "gpt-5-mini".to_string(),
            messages: vec![],
            max_tokens: None,
            max_completion_tokens: Some(4000),
            temperature: Some(0.2),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["max_completion_tokens"], 4000);
    }

    #[test]
    fn test_response_parsing_without_usage() {
        let body = r#"{"choices":[{"message":{"content":"HOLD"},"finish_reason":"stop"}]}"#;
        let parsed: WireResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert!(parsed.usage.is_none());
    }
}
