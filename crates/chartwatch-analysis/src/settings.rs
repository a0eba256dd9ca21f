//! Provider enablement settings
//!
//! Each provider is switched on with an `*_ENABLED` env flag and needs its
//! API key present; an enabled provider without a key is disabled with a
//! warning rather than failing the run.

use tracing::warn;

/// Default models, overridable per provider through env
const DEFAULT_PERPLEXITY_MODEL: &str = "sonar-pro";
const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_GROK_MODEL: &str = "grok-2";
const DEFAULT_GOOGLE_MODEL: &str = "gemini-2.0-flash-exp";

/// Default trend-change probability threshold quoted in the alert rule
const DEFAULT_EMAIL_ALERT_THRESHOLD: u8 = 60;

/// Credentials and model for one enabled provider
#[derive(Debug, Clone)]
pub struct ProviderSlot {
    pub api_key: String,
    pub model: String,
}

/// Which providers run, with their keys and models
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// Perplexity chart analysis
    pub perplexity: Option<ProviderSlot>,
    /// Claude chart analysis
    pub claude: Option<ProviderSlot>,
    /// OpenAI chart analysis
    pub openai: Option<ProviderSlot>,
    /// Grok chart analysis
    pub grok: Option<ProviderSlot>,
    /// Gemini chart analysis
    pub google_chart: Option<ProviderSlot>,
    /// Gemini consolidation pass
    pub google_consolidation: Option<ProviderSlot>,
    /// Probability threshold quoted to providers in the alert rule
    pub email_alert_threshold: u8,
}

impl ProviderSettings {
    /// Load settings from environment variables
    pub fn from_env() -> Self {
        let google_key = slot(
            "GOOGLE_AI_CHART_ENABLED",
            "GOOGLE_AI_API_KEY",
            "GOOGLE_AI_MODEL",
            DEFAULT_GOOGLE_MODEL,
        );
        let google_consolidation = slot(
            "GOOGLE_AI_CONSOLIDATION_ENABLED",
            "GOOGLE_AI_API_KEY",
            "GOOGLE_AI_MODEL",
            DEFAULT_GOOGLE_MODEL,
        );

        Self {
            perplexity: slot(
                "PERPLEXITY_ENABLED",
                "PERPLEXITY_API_KEY",
                "PERPLEXITY_MODEL",
                DEFAULT_PERPLEXITY_MODEL,
            ),
            claude: slot(
                "CLAUDE_ENABLED",
                "ANTHROPIC_API_KEY",
                "CLAUDE_MODEL",
                DEFAULT_CLAUDE_MODEL,
            ),
            openai: slot(
                "OPENAI_ENABLED",
                "OPENAI_API_KEY",
                "OPENAI_MODEL",
                DEFAULT_OPENAI_MODEL,
            ),
            grok: slot("GROK_ENABLED", "GROK_API_KEY", "GROK_MODEL", DEFAULT_GROK_MODEL),
            google_chart: google_key,
            google_consolidation,
            email_alert_threshold: std::env::var("EMAIL_ALERT_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EMAIL_ALERT_THRESHOLD),
        }
    }

    /// Number of chart-analysis providers enabled (consolidation excluded)
    pub fn enabled_count(&self) -> usize {
        [
            self.perplexity.is_some(),
            self.claude.is_some(),
            self.openai.is_some(),
            self.grok.is_some(),
            self.google_chart.is_some(),
        ]
        .into_iter()
        .filter(|enabled| *enabled)
        .count()
    }

    /// Whether no chart-analysis provider is enabled
    pub fn is_empty(&self) -> bool {
        self.enabled_count() == 0
    }
}

fn slot(enable_var: &str, key_var: &str, model_var: &str, default_model: &str) -> Option<ProviderSlot> {
    let enabled = std::env::var(enable_var).is_ok_and(|v| v.eq_ignore_ascii_case("true"));
    if !enabled {
        return None;
    }

    match std::env::var(key_var) {
        Ok(api_key) if !api_key.trim().is_empty() => Some(ProviderSlot {
            api_key,
            model: std::env::var(model_var).unwrap_or_else(|_| default_model.to_string()),
        }),
        _ => {
            warn!("{enable_var}=true but {key_var} not found, provider disabled");
            None
        }
    }
}
