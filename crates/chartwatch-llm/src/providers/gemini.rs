//! Google Gemini provider implementation
//!
//! Implements the LLMProvider trait against the Generative Language REST
//! API (`models/{model}:generateContent`). Gemini serves two roles in the
//! pipeline: chart analysis like any other provider, and the consolidation
//! call that merges the other providers' analyses into one decision.

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, ImageSource, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    api_key: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self { client, api_key })
    }

    /// Create a provider from environment variable
    ///
    /// Reads the API key from the `GOOGLE_AI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_AI_API_KEY").map_err(|_| {
            crate::LLMError::ConfigurationError(
                "GOOGLE_AI_API_KEY environment variable not set".to_string(),
            )
        })?;
        Self::new(api_key)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Gemini API");

        let gemini_request = GeminiRequest {
            contents: request.messages.iter().map(convert_message).collect(),
            system_instruction: request.system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text { text }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let response = self
            .client
            .post(format!(
                "{GEMINI_API_BASE}/models/{}:generateContent",
                request.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&gemini_request)
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

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            crate::LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| {
                crate::LLMError::UnexpectedResponse("No candidates in response".to_string())
            })?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .find_map(|part| match part {
                GeminiPart::Text { text } => Some(text),
                GeminiPart::InlineData { .. } => None,
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                crate::LLMError::UnexpectedResponse("Empty response from Gemini".to_string())
            })?;

        let usage = gemini_response.usage_metadata.unwrap_or_default();
        debug!(
            "Received response - finish_reason: {:?}, tokens: {}/{}",
            candidate.finish_reason, usage.prompt_token_count, usage.candidates_token_count
        );

        Ok(CompletionResponse {
            message: Message::assistant(text),
            stop_reason: match candidate.finish_reason.as_deref() {
                Some("MAX_TOKENS") => StopReason::MaxTokens,
                _ => StopReason::EndTurn,
            },
            usage: TokenUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
            },
        })
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

// Gemini-specific request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

// Untagged: a part is either {"text": ...} or {"inline_data": {...}}
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

/// Convert a generic message to Gemini content
///
/// Image blocks become `inline_data` parts; data URIs are split into the
/// mime type and raw base64 payload Gemini expects.
fn convert_message(msg: &Message) -> GeminiContent {
    let role = match msg.role {
        Role::Assistant => "model",
        Role::User | Role::System => "user",
    };

    let parts = match &msg.content {
        MessageContent::Text(text) => vec![GeminiPart::Text { text: text.clone() }],
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(GeminiPart::Text { text: text.clone() }),
                ContentBlock::Image { source } => convert_image(source),
            })
            .collect(),
    };

    GeminiContent {
        role: Some(role.to_string()),
        parts,
    }
}

fn convert_image(source: &ImageSource) -> Option<GeminiPart> {
    let (mime_type, data) = match source {
        ImageSource::Base64 { media_type, data } => (media_type.clone(), data.clone()),
        ImageSource::Url { url } => match ImageSource::from_data_uri(url) {
            Some(ImageSource::Base64 { media_type, data }) => (media_type, data),
            _ => {
                debug!("Dropping non-data-URI image for Gemini: {}", url);
                return None;
            }
        },
    };

    Some(GeminiPart::InlineData {
        inline_data: InlineData { mime_type, data },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new("test-key".to_string());
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().name(), "google");
    }

    #[test]
    fn test_from_env_without_key() {
        // SAFETY: test-only env mutation
        unsafe {
            std::env::remove_var("GOOGLE_AI_API_KEY");
        }
        assert!(GeminiProvider::from_env().is_err());
    }

    #[test]
    fn test_message_conversion() {
        let msg = Message::user_with_images(
            "Analyze these charts",
            vec![ImageSource::Base64 {
                media_type: "image/png".to_string(),
                data: "abc".to_string(),
            }],
        );
        let content = convert_message(&msg);
        assert_eq!(content.role.as_deref(), Some("user"));
        assert_eq!(content.parts.len(), 2);
        match &content.parts[1] {
            GeminiPart::InlineData { inline_data } => {
                assert_eq!(inline_data.mime_type, "image/png");
                assert_eq!(inline_data.data, "abc");
            }
            GeminiPart::Text { .. } => panic!("Expected inline data part"),
        }
    }

    #[test]
    fn test_assistant_maps_to_model_role() {
        let msg = Message::assistant("prior reply");
        let content = convert_message(&msg);
        assert_eq!(content.role.as_deref(), Some("model"));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "BUY"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2}
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        let usage = parsed.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 10);
        assert_eq!(usage.candidates_token_count, 2);
    }

    #[test]
    fn test_empty_candidates() {
        let parsed: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
