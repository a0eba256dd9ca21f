//! Chart-analysis prompt
//!
//! Every provider receives the same prompt: base instructions, the chart
//! contexts for the captured windows, and the trend-evaluation contract.
//! Replies must come back in two marked sections; the second carries a JSON
//! object the parser in chartwatch-analysis consumes.

use crate::contexts::combined_context;
use crate::error::Result;
use chartwatch_capture::ChartWindow;
use minijinja::{Environment, context};

/// Marker opening the free-text analysis section of a reply
pub const ANALYSIS_MARKER: &str = "=== ANALYSIS ===";

/// Marker opening the structured trend-evaluation section of a reply
pub const TREND_EVALUATION_MARKER: &str = "=== TREND_EVALUATION ===";

/// Prior analysis text is trimmed to this many characters in the prompt
const PRIOR_EXCERPT_LEN: usize = 500;

const ANALYSIS_TEMPLATE: &str = r#"
You are an expert stock market analyst. Analyze these {{ num_charts }} chart screenshots{{ symbol_text }}.

CRITICAL INSTRUCTION: Only analyze what you can clearly see in the screenshots. If a chart window appears blank, contains no data, or is not loaded properly, explicitly state "Chart not loaded" or "No data visible" for that window. DO NOT make assumptions or provide analysis for charts that are not visible or contain no data.

IMPORTANT: Provide a COMPREHENSIVE and DETAILED analysis. Each section should be thorough with specific observations from each chart. Do not summarize or abbreviate - include all relevant details you can observe.

{{ chart_context }}
ANALYSIS FORMAT (provide detailed content for each section):

**MARKET OVERVIEW** (2-3 sentences)
Current price, timeframe, and overall market condition.

**KEY VISIBLE INDICATORS**
Provide DETAILED analysis for each chart. List specific indicators visible with their current readings and interpretations:
- For Trend Analysis chart: LuxAlgo signals, price action concepts, overlays - describe specific signal types, colors, and what they indicate
- For Smoothed Heiken Ashi chart: Heiken Ashi candles, HEMA trend, divergences - describe candle colors, trend direction, any divergence signals
- For Volume Layout chart: Money flow profile, CVD divergence, SQZMOM_LB, MA distance with StdDev bands, +RD/-RD signals - describe each indicator's current state
- For Volume Profile chart: RVOL, VOLD ratio, MS overbought/oversold, order blocks - describe each indicator's current state
- For Symbolik Workspace chart: ATM chart lines, ATM Elliott Waves/Projections, ATM Pressure alerts, TKT analysis/score, Variable Aggressive Sequential (Demark) - describe wave counts, projections, and sequential numbers
- Moving averages, oscillators, volume data, support/resistance levels - include specific price levels where visible

**CRITICAL SIGNALS**
Most important actionable signals (include any +RD or -RD formations, MS overbought/oversold conditions, ATM chart line alignments, Demark Sequential 9s or 13s if present). Be specific about what you see and why it matters.

**TRADING DECISION**
Clear BUY/SELL/HOLD with detailed rationale based on the indicators analyzed above.

**TREND CHANGE EVALUATION**
{% if prior %}Compare with prior analysis and evaluate changes.

Prior: {{ prior }}...

**RESPONSE FORMAT:**
=== ANALYSIS ===
[Your analysis here]

=== TREND_EVALUATION ===
{% raw %}{
    "alert_level": "critical/high/medium/low",
    "trend_change_probability": 85,
    "confidence_level": "very_high/high/medium/low",
    "summary": "Brief explanation",
    "key_changes": ["change1", "change2"],
    "probability_reasoning": "Why this probability"
}{% endraw %}

Rules: Send email only if probability >= {{ email_threshold }}%
{% else %}This is the INITIAL ANALYSIS.

=== ANALYSIS ===
[Your analysis]

=== TREND_EVALUATION ===
{% raw %}{
    "alert_level": "info",
    "trend_change_probability": 0,
    "confidence_level": "high",
    "summary": "Initial analysis - no prior data",
    "key_changes": [],
    "probability_reasoning": "First analysis session"
}{% endraw %}
{% endif %}"#;

/// Render the chart-analysis prompt
///
/// # Arguments
///
/// * `windows` - Captured windows, in capture order
/// * `prior` - Previous combined analysis, when one exists
/// * `symbol` - Stock symbol being analyzed
/// * `email_threshold` - Probability threshold quoted in the alert rule
pub fn analysis_prompt(
    windows: &[ChartWindow],
    prior: Option<&str>,
    symbol: Option<&str>,
    email_threshold: u8,
) -> Result<String> {
    let symbol_text = symbol.map(|s| format!(" for {s}")).unwrap_or_default();
    let prior_excerpt = prior.map(|p| truncate_chars(p, PRIOR_EXCERPT_LEN));

    let env = Environment::new();
    let rendered = env.render_str(
        ANALYSIS_TEMPLATE,
        context! {
            num_charts => windows.len(),
            symbol_text => symbol_text,
            chart_context => combined_context(windows),
            prior => prior_excerpt,
            email_threshold => email_threshold,
        },
    )?;

    Ok(rendered.trim_start().to_string())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
