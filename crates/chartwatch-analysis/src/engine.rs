//! Provider fan-out engine
//!
//! One analysis request is built per run (prompt + encoded screenshots) and
//! sent to every enabled provider concurrently. Provider failures are
//! isolated: the run proceeds with whatever subset succeeded.

use crate::assessment::{TrendAssessment, parse_reply};
use crate::error::{AnalysisError, Result};
use crate::settings::ProviderSettings;
use chartwatch_capture::{ChartWindow, ScreenshotSet};
use chartwatch_llm::providers::{
    AnthropicProvider, GeminiProvider, OpenAiCompatConfig, OpenAiCompatProvider,
};
use chartwatch_llm::{
    CompletionRequest, CompletionResponse, ImageSource, LLMProvider, Message, RetryPolicy,
};
use chartwatch_utils::encode_image_to_base64;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Request budget for chart analysis
const ANALYSIS_MAX_TOKENS: usize = 4000;
/// Claude runs with a tighter reply budget
const CLAUDE_MAX_TOKENS: usize = 1024;
/// Low temperature keeps the reply format stable
const ANALYSIS_TEMPERATURE: f32 = 0.2;

/// One provider's analysis of a screenshot set
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    /// Provider name (e.g., "perplexity")
    pub provider: String,
    /// Free-text analysis
    pub analysis: String,
    /// Parsed trend assessment
    pub assessment: TrendAssessment,
}

struct EngineSlot {
    name: String,
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
}

/// Fans one analysis request out to every enabled provider
pub struct AnalysisEngine {
    slots: Vec<EngineSlot>,
    retry: RetryPolicy,
    email_threshold: u8,
}

impl AnalysisEngine {
    /// Build an engine from provider settings
    ///
    /// Returns [`AnalysisError::NoProviders`] when nothing is enabled.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let mut engine = Self::empty(settings.email_alert_threshold);

        if let Some(slot) = &settings.perplexity {
            let provider =
                OpenAiCompatProvider::with_config(OpenAiCompatConfig::perplexity(slot.api_key.clone()))?;
            engine.push_provider("perplexity", Arc::new(provider), slot.model.clone(), ANALYSIS_MAX_TOKENS);
        }
        if let Some(slot) = &settings.claude {
            let provider = AnthropicProvider::new(slot.api_key.clone())?;
            engine.push_provider("claude", Arc::new(provider), slot.model.clone(), CLAUDE_MAX_TOKENS);
        }
        if let Some(slot) = &settings.google_chart {
            let provider = GeminiProvider::new(slot.api_key.clone())?;
            engine.push_provider("google", Arc::new(provider), slot.model.clone(), ANALYSIS_MAX_TOKENS);
        }
        if let Some(slot) = &settings.grok {
            let provider =
                OpenAiCompatProvider::with_config(OpenAiCompatConfig::grok(slot.api_key.clone()))?;
            engine.push_provider("grok", Arc::new(provider), slot.model.clone(), ANALYSIS_MAX_TOKENS);
        }
        if let Some(slot) = &settings.openai {
            let provider =
                OpenAiCompatProvider::with_config(OpenAiCompatConfig::openai(slot.api_key.clone()))?;
            engine.push_provider("openai", Arc::new(provider), slot.model.clone(), ANALYSIS_MAX_TOKENS);
        }

        if engine.slots.is_empty() {
            return Err(AnalysisError::NoProviders);
        }
        Ok(engine)
    }

    /// Create an engine with no providers (add them with `push_provider`)
    pub fn empty(email_threshold: u8) -> Self {
        Self {
            slots: Vec::new(),
            retry: RetryPolicy::default(),
            email_threshold,
        }
    }

    /// Register a provider slot
    pub fn push_provider(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        max_tokens: usize,
    ) {
        self.slots.push(EngineSlot {
            name: name.into(),
            provider,
            model: model.into(),
            max_tokens,
        });
    }

    /// Override the retry policy (tests use a fast one)
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Names of the registered providers, in fan-out order
    pub fn provider_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Analyze a screenshot set with every registered provider
    ///
    /// Returns outcomes in registration order; providers that fail are
    /// dropped with a warning.
    pub async fn analyze(
        &self,
        screenshots: &ScreenshotSet,
        symbol: &str,
    ) -> Result<Vec<ProviderOutcome>> {
        let valid = screenshots.valid();
        if valid.is_empty() {
            return Err(AnalysisError::NoScreenshots);
        }

        // Encode screenshots; a single unreadable file is not fatal
        let mut windows: Vec<ChartWindow> = Vec::new();
        let mut images: Vec<ImageSource> = Vec::new();
        for (window, path) in valid {
            match encode_image_to_base64(path) {
                Ok(uri) => {
                    if let Some(source) = ImageSource::from_data_uri(&uri) {
                        windows.push(window);
                        images.push(source);
                    }
                }
                Err(e) => warn!("failed to encode {window} screenshot: {e}"),
            }
        }
        if images.is_empty() {
            return Err(AnalysisError::NoScreenshots);
        }

        // Individual providers analyze the current state only; the prior
        // analysis enters later, at consolidation.
        let prompt =
            chartwatch_prompt::analysis_prompt(&windows, None, Some(symbol), self.email_threshold)?;
        let message = Message::user_with_images(prompt, images);

        info!(
            "starting parallel analysis of {} screenshots with {} providers",
            windows.len(),
            self.slots.len()
        );

        let mut tasks: JoinSet<(String, chartwatch_llm::Result<CompletionResponse>)> =
            JoinSet::new();
        for slot in &self.slots {
            let name = slot.name.clone();
            let provider = Arc::clone(&slot.provider);
            let retry = self.retry.clone();
            let request = CompletionRequest::builder(slot.model.clone())
                .add_message(message.clone())
                .max_tokens(slot.max_tokens)
                .temperature(ANALYSIS_TEMPERATURE)
                .build();

            tasks.spawn(async move {
                let op_name = name.clone();
                let result = retry
                    .execute(&op_name, || provider.complete(request.clone()))
                    .await;
                (name, result)
            });
        }

        let mut outcomes: Vec<ProviderOutcome> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(response))) => {
                    let (analysis, assessment) = parse_reply(response.text());
                    info!("{name}: analysis complete ({} chars)", analysis.len());
                    outcomes.push(ProviderOutcome {
                        provider: name,
                        analysis,
                        assessment,
                    });
                }
                Ok((name, Err(e))) => warn!("{name}: analysis failed: {e}"),
                Err(e) => warn!("provider task panicked: {e}"),
            }
        }

        // Completion order is nondeterministic; restore registration order
        outcomes.sort_by_key(|outcome| {
            self.slots
                .iter()
                .position(|slot| slot.name == outcome.provider)
                .unwrap_or(usize::MAX)
        });

        info!(
            "parallel analysis complete, successful providers: {:?}",
            outcomes.iter().map(|o| o.provider.as_str()).collect::<Vec<_>>()
        );
        Ok(outcomes)
    }
}
