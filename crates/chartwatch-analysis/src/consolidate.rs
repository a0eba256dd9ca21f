//! Consolidated trading decision
//!
//! The consolidation model (Gemini in the default configuration) reads
//! every provider analysis and writes the final decision text, including
//! the explicit email-alert line. When the model is unavailable or the
//! call fails, the local voting fallback produces the decision instead.

use crate::consensus::local_consolidated_decision;
use crate::engine::ProviderOutcome;
use chartwatch_llm::{CompletionRequest, LLMProvider, Message, RetryPolicy};
use chartwatch_prompt::ProviderAnalysis;
use std::sync::Arc;
use tracing::{info, warn};

/// Reply budget for the consolidation pass
const CONSOLIDATION_MAX_TOKENS: usize = 4000;
const CONSOLIDATION_TEMPERATURE: f32 = 0.2;

/// Runs the consolidation pass over provider outcomes
pub struct Consolidator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    retry: RetryPolicy,
}

impl Consolidator {
    /// Create a consolidator over a provider and model
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy (tests use a fast one)
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Produce the consolidated decision text
    ///
    /// Falls back to the local voting decision when the prompt fails to
    /// render or the model call exhausts its retries.
    pub async fn consolidate(
        &self,
        symbol: &str,
        outcomes: &[ProviderOutcome],
        prior: Option<&str>,
    ) -> String {
        if outcomes.is_empty() {
            return format!(
                "\n=== CONSOLIDATED TRADING DECISION ===\nNo provider analyses available for {symbol}.\n"
            );
        }

        let analyses: Vec<ProviderAnalysis> = outcomes
            .iter()
            .map(|o| ProviderAnalysis::new(o.provider.clone(), o.analysis.clone()))
            .collect();

        let prompt = match chartwatch_prompt::consolidation_prompt(symbol, &analyses, prior) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("consolidation prompt failed to render: {e}");
                return local_consolidated_decision(outcomes, symbol);
            }
        };

        let request = CompletionRequest::builder(&self.model)
            .add_message(Message::user(prompt))
            .max_tokens(CONSOLIDATION_MAX_TOKENS)
            .temperature(CONSOLIDATION_TEMPERATURE)
            .build();

        let provider = Arc::clone(&self.provider);
        match self
            .retry
            .execute("consolidation", || provider.complete(request.clone()))
            .await
        {
            Ok(response) => {
                info!(
                    "consolidated decision generated by {} ({})",
                    self.provider.name(),
                    self.model
                );
                response.text().to_string()
            }
            Err(e) => {
                warn!("consolidation failed, using local decision: {e}");
                local_consolidated_decision(outcomes, symbol)
            }
        }
    }
}
