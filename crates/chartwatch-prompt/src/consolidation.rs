//! Consolidation prompt
//!
//! After the per-provider analyses come back, one more model call merges
//! them into a single decision. The reply must end with an explicit
//! `EMAIL ALERT DECISION: YES/NO` line the alert logic keys on.

use crate::error::Result;
use minijinja::{Environment, context};
use serde::Serialize;

/// Prior analysis text is trimmed to this many characters in the prompt
const PRIOR_EXCERPT_LEN: usize = 1000;

/// One provider's contribution to the consolidation prompt
#[derive(Debug, Clone, Serialize)]
pub struct ProviderAnalysis {
    /// Provider name (e.g., "perplexity")
    pub name: String,
    /// Full analysis text from that provider
    pub analysis: String,
}

impl ProviderAnalysis {
    pub fn new(name: impl Into<String>, analysis: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            analysis: analysis.into(),
        }
    }
}

const CONSOLIDATION_TEMPLATE: &str = r"
You are an expert financial analyst tasked with creating a consolidated trading decision based on analyses from multiple AI providers.

**SYMBOL:** {{ symbol }}

**INDIVIDUAL AI PROVIDER ANALYSES:**
{% for provider in providers %}
{{ provider.name | upper }} ANALYSIS:
{{ provider.analysis }}
{% endfor %}
{% if prior %}
PRIOR ANALYSIS FOR COMPARISON:
{{ prior }}...

TREND CHANGE EVALUATION REQUIRED:
Compare the current analyses above with the prior analysis to evaluate if there are significant changes or trend shifts.
{% else %}
INITIAL ANALYSIS:
This is the first analysis for this symbol, so focus on current state evaluation.
{% endif %}
**YOUR TASK:**
1. Review all provider analyses above
2. Identify consensus and disagreements
3. Weight the most reliable signals
4. Create a FINAL consolidated analysis

**REQUIRED OUTPUT FORMAT:**

=== CONSOLIDATED ANALYSIS ===

**CONSENSUS OVERVIEW**
Summary of where providers agree/disagree.

**KEY TECHNICAL LEVELS**
- Support: [levels from multiple providers]
- Resistance: [levels from multiple providers]

**SIGNAL ALIGNMENT**
Which signals are confirmed across multiple providers vs single-provider signals.

**CONSOLIDATED TRADING DECISION**
[STRONG BUY / BUY / HOLD / SELL / STRONG SELL]
Confidence: [HIGH/MEDIUM/LOW]
Rationale: [Why this decision based on multi-provider consensus]

**RISK ASSESSMENT**
Key risks and stop-loss recommendations.

**PROVIDER SYNTHESIS**
{% for provider in providers %}- {{ provider.name | title }} Focus: [Summarize key points from {{ provider.name | title }}]
{% endfor %}- Agreement Areas: [Where providers align]
- Disagreement Areas: [Where providers differ]

=== EMAIL ALERT DECISION ===

Based on the consolidated analysis above, should an email alert be sent to notify the trader?

Consider:
- Significance of the signals (are there actionable opportunities?)
- Provider consensus (do multiple providers agree?)
- Risk/reward profile
- Urgency of the situation

**EMAIL ALERT DECISION: [YES/NO]**
**REASON:** [Brief explanation for the decision]

If YES, the email should highlight:
- Primary trading signal
- Key support/resistance levels
- Recommended action
- Risk considerations
";

/// Render the consolidation prompt over all provider analyses
pub fn consolidation_prompt(
    symbol: &str,
    providers: &[ProviderAnalysis],
    prior: Option<&str>,
) -> Result<String> {
    let prior_excerpt: Option<String> =
        prior.map(|p| p.chars().take(PRIOR_EXCERPT_LEN).collect());

    let env = Environment::new();
    let rendered = env.render_str(
        CONSOLIDATION_TEMPLATE,
        context! {
            symbol => symbol,
            providers => providers,
            prior => prior_excerpt,
        },
    )?;

    Ok(rendered.trim_start().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_providers() -> Vec<ProviderAnalysis> {
        vec![
            ProviderAnalysis::new("claude", "Bullish breakout on volume."),
            ProviderAnalysis::new("perplexity", "Momentum fading near resistance."),
        ]
    }

    #[test]
    fn test_provider_sections_present() {
        let prompt = consolidation_prompt("QBTS", &sample_providers(), None).unwrap();

        assert!(prompt.contains("**SYMBOL:** QBTS"));
        assert!(prompt.contains("CLAUDE ANALYSIS:"));
        assert!(prompt.contains("PERPLEXITY ANALYSIS:"));
        assert!(prompt.contains("Bullish breakout on volume."));
        assert!(prompt.contains("EMAIL ALERT DECISION: [YES/NO]"));
    }

    #[test]
    fn test_synthesis_line_per_provider() {
        let prompt = consolidation_prompt("QBTS", &sample_providers(), None).unwrap();
        assert!(prompt.contains("- Claude Focus:"));
        assert!(prompt.contains("- Perplexity Focus:"));
    }

    #[test]
    fn test_initial_vs_prior_context() {
        let initial = consolidation_prompt("QBTS", &sample_providers(), None).unwrap();
        assert!(initial.contains("INITIAL ANALYSIS:"));

        let with_prior =
            consolidation_prompt("QBTS", &sample_providers(), Some("old text")).unwrap();
        assert!(with_prior.contains("PRIOR ANALYSIS FOR COMPARISON:"));
        assert!(with_prior.contains("old text"));
        assert!(!with_prior.contains("INITIAL ANALYSIS:"));
    }

    #[test]
    fn test_prior_truncated() {
        let long_prior = "y".repeat(5000);
        let prompt =
            consolidation_prompt("QBTS", &sample_providers(), Some(&long_prior)).unwrap();
        assert!(prompt.contains(&"y".repeat(1000)));
        assert!(!prompt.contains(&"y".repeat(1001)));
    }
}
