//! Anthropic Claude provider implementation
//!
//! Implements the LLMProvider trait against the Anthropic messages API.
//! See: https://docs.anthropic.com/en/api/messages

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, ImageSource, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
///
/// Vision-capable Claude models read the chart screenshots directly; the
/// default model used by the pipeline is claude-sonnet-4-5-20250929.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self { client, api_key })
    }

    /// Create a provider from environment variable
    ///
    /// Reads the API key from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            crate::LLMError::ConfigurationError(
                "ANTHROPIC_API_KEY environment variable not set".to_string(),
            )
        })?;
        Self::new(api_key)
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Anthropic API");

        let anthropic_request = AnthropicRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(convert_message).collect(),
            system: request.system,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{ANTHROPIC_API_BASE}/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
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

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            crate::LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        debug!(
            "Received response - stop_reason: {}, tokens: {}/{}",
            anthropic_response.stop_reason,
            anthropic_response.usage.input_tokens,
            anthropic_response.usage.output_tokens
        );

        let text = anthropic_response
            .content
            .iter()
            .find_map(|block| match block {
                AnthropicResponseBlock::Text { text } => Some(text.clone()),
            })
            .ok_or_else(|| {
                crate::LLMError::UnexpectedResponse("No text block in response".to_string())
            })?;

        Ok(CompletionResponse {
            message: Message::assistant(text),
            stop_reason: match anthropic_response.stop_reason.as_str() {
                "max_tokens" => StopReason::MaxTokens,
                "stop_sequence" => StopReason::StopSequence,
                "end_turn" => StopReason::EndTurn,
                other => {
                    debug!("Unknown stop reason: {}", other);
                    StopReason::EndTurn
                }
            },
            usage: TokenUsage {
                input_tokens: anthropic_response.usage.input_tokens,
                output_tokens: anthropic_response.usage.output_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// Anthropic-specific request/response types
// These match the Anthropic API format exactly

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text { text: String },
    Image { source: AnthropicImageSource },
}

#[derive(Debug, Serialize)]
struct AnthropicImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseBlock>,
    stop_reason: String,
    usage: UsageResponse,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicResponseBlock {
    Text { text: String },
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    input_tokens: usize,
    output_tokens: usize,
}

/// Convert a generic message to the Anthropic wire shape
///
/// Data-URI image URLs are unpacked into base64 source blocks; plain URLs
/// are not supported by this pipeline and are dropped with a debug note.
fn convert_message(msg: &Message) -> AnthropicMessage {
    let role = match msg.role {
        Role::Assistant => "assistant",
        // Anthropic has no system role inside messages; system text travels
        // in the top-level field, so anything else maps to user
        Role::User | Role::System => "user",
    };

    let content = match &msg.content {
        MessageContent::Text(text) => vec![AnthropicBlock::Text { text: text.clone() }],
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(AnthropicBlock::Text { text: text.clone() }),
                ContentBlock::Image { source } => convert_image(source),
            })
            .collect(),
    };

    AnthropicMessage { role, content }
}

fn convert_image(source: &ImageSource) -> Option<AnthropicBlock> {
    let (media_type, data) = match source {
        ImageSource::Base64 { media_type, data } => (media_type.clone(), data.clone()),
        ImageSource::Url { url } => match ImageSource::from_data_uri(url) {
            Some(ImageSource::Base64 { media_type, data }) => (media_type, data),
            _ => {
                debug!("Dropping non-data-URI image for Anthropic: {}", url);
                return None;
            }
        },
    };

    Some(AnthropicBlock::Image {
        source: AnthropicImageSource {
            source_type: "base64",
            media_type,
            data,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = AnthropicProvider::new("test-key".to_string());
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().name(), "anthropic");
    }

    #[test]
    fn test_from_env_without_key() {
        // SAFETY: This is a test that modifies env vars, which is safe in single-threaded test context
        unsafe {
            std::env::remove_var("ANTHROPIC_API_KEY");
        }
        let result = AnthropicProvider::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_image_conversion() {
        let msg = Message::user_with_images(
            "Analyze",
            vec![ImageSource::Base64 {
                media_type: "image/png".to_string(),
                data: "abc".to_string(),
            }],
        );
        let converted = convert_message(&msg);
        assert_eq!(converted.role, "user");
        assert_eq!(converted.content.len(), 2);
        match &converted.content[1] {
            AnthropicBlock::Image { source } => {
                assert_eq!(source.source_type, "base64");
                assert_eq!(source.media_type, "image/png");
            }
            AnthropicBlock::Text { .. } => panic!("Expected image block"),
        }
    }

    #[test]
    fn test_data_uri_unpacked() {
        let msg = Message::user_with_images(
            "Analyze",
            vec![ImageSource::Url {
                url: "data:image/jpeg;base64,zzz".to_string(),
            }],
        );
        let converted = convert_message(&msg);
        assert_eq!(converted.content.len(), 2);
        match &converted.content[1] {
            AnthropicBlock::Image { source } => assert_eq!(source.media_type, "image/jpeg"),
            AnthropicBlock::Text { .. } => panic!("Expected image block"),
        }
    }

    #[test]
    fn test_plain_url_dropped() {
        let msg = Message::user_with_images(
            "Analyze",
            vec![ImageSource::Url {
                url: "https://example.com/chart.png".to_string(),
            }],
        );
        let converted = convert_message(&msg);
        // Text survives, the unresolvable image does not
        assert_eq!(converted.content.len(), 1);
    }
}
