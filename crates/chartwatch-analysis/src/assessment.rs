//! Trend assessments parsed from provider replies
//!
//! Providers answer in two marked sections: free-text analysis, then a JSON
//! object with the trend evaluation. The parser is lenient by design — a
//! reply that ignores the contract still yields the full text plus a
//! neutral assessment, never an error.

use chartwatch_prompt::{ANALYSIS_MARKER, TREND_EVALUATION_MARKER};
use serde::{Deserialize, Serialize};

/// Alert severity, ordered from informational to critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    /// Parse a level case-insensitively; unknown strings map to Low
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "info" => Self::Info,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Low,
        }
    }

    /// Lowercase name, matching the prompt contract
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured trend evaluation extracted from a provider reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAssessment {
    /// Alert severity reported by the provider
    pub alert_level: AlertLevel,

    /// Probability of a significant trend change, 0-100
    pub trend_change_probability: f64,

    /// Provider-reported confidence (free-form: "high", "very_high", ...)
    pub confidence_level: String,

    /// One-line summary
    pub summary: String,

    /// Key changes since the prior analysis
    pub key_changes: Vec<String>,

    /// Why the provider chose this probability
    pub probability_reasoning: String,

    /// Whether this assessment should count toward the alert consensus
    pub has_changes: bool,
}

impl TrendAssessment {
    /// Neutral assessment used when a reply cannot be parsed
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            alert_level: AlertLevel::Low,
            trend_change_probability: 0.0,
            confidence_level: "low".to_string(),
            summary: "Analysis completed".to_string(),
            key_changes: Vec::new(),
            probability_reasoning: reason.into(),
            has_changes: false,
        }
    }
}

// Lenient wire shape for the TREND_EVALUATION JSON object
#[derive(Debug, Deserialize)]
struct RawTrend {
    #[serde(default)]
    alert_level: Option<String>,
    #[serde(default)]
    trend_change_probability: Option<f64>,
    #[serde(default)]
    confidence_level: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    key_changes: Option<Vec<String>>,
    #[serde(default)]
    probability_reasoning: Option<String>,
    #[serde(default)]
    has_changes: Option<bool>,
}

/// Parse a provider reply into analysis text and a trend assessment
///
/// When both section markers are present, the text between them is the
/// analysis and the first `{`..last `}` slice of the evaluation section is
/// parsed as JSON. Anything else falls back to the whole reply plus a
/// neutral assessment.
pub fn parse_reply(reply: &str) -> (String, TrendAssessment) {
    if let Some((analysis, trend_section)) = split_sections(reply) {
        if let Some(json_slice) = extract_json(trend_section) {
            match serde_json::from_str::<RawTrend>(json_slice) {
                Ok(raw) => return (analysis.to_string(), assessment_from_raw(raw)),
                Err(e) => {
                    tracing::warn!("trend evaluation JSON did not parse: {e}");
                }
            }
        }
    }

    (
        reply.to_string(),
        TrendAssessment::fallback("Could not parse structured response"),
    )
}

fn split_sections(reply: &str) -> Option<(&str, &str)> {
    let after_analysis = reply.split_once(ANALYSIS_MARKER)?.1;
    let (analysis, trend) = after_analysis.split_once(TREND_EVALUATION_MARKER)?;
    Some((analysis.trim(), trend.trim()))
}

fn extract_json(section: &str) -> Option<&str> {
    let start = section.find('{')?;
    let end = section.rfind('}')?;
    (end > start).then(|| &section[start..=end])
}

fn assessment_from_raw(raw: RawTrend) -> TrendAssessment {
    TrendAssessment {
        alert_level: raw
            .alert_level
            .as_deref()
            .map_or(AlertLevel::Low, AlertLevel::parse),
        trend_change_probability: raw.trend_change_probability.unwrap_or(0.0).clamp(0.0, 100.0),
        confidence_level: raw.confidence_level.unwrap_or_else(|| "low".to_string()),
        summary: raw.summary.unwrap_or_else(|| "No summary".to_string()),
        key_changes: raw.key_changes.unwrap_or_default(),
        probability_reasoning: raw
            .probability_reasoning
            .unwrap_or_else(|| "No reasoning".to_string()),
        has_changes: raw.has_changes.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURED_REPLY: &str = r#"
Some preamble the model added.
=== ANALYSIS ===
**MARKET OVERVIEW**
Price is consolidating under resistance.

=== TREND_EVALUATION ===
Here is the evaluation:
{
    "alert_level": "high",
    "trend_change_probability": 85,
    "confidence_level": "very_high",
    "summary": "Breakout forming",
    "key_changes": ["volume surge", "+RD formed"],
    "probability_reasoning": "Multiple confirming signals"
}
"#;

    #[test]
    fn test_parse_structured_reply() {
        let (analysis, assessment) = parse_reply(STRUCTURED_REPLY);

        assert!(analysis.starts_with("**MARKET OVERVIEW**"));
        assert!(!analysis.contains("TREND_EVALUATION"));
        assert_eq!(assessment.alert_level, AlertLevel::High);
        assert_eq!(assessment.trend_change_probability, 85.0);
        assert_eq!(assessment.confidence_level, "very_high");
        assert_eq!(assessment.key_changes.len(), 2);
        assert!(!assessment.has_changes);
    }

    #[test]
    fn test_unstructured_reply_falls_back() {
        let reply = "The chart looks bullish but I cannot follow formats.";
        let (analysis, assessment) = parse_reply(reply);

        assert_eq!(analysis, reply);
        assert_eq!(assessment.alert_level, AlertLevel::Low);
        assert_eq!(assessment.trend_change_probability, 0.0);
        assert_eq!(
            assessment.probability_reasoning,
            "Could not parse structured response"
        );
    }

    #[test]
    fn test_bad_json_falls_back() {
        let reply = format!(
            "{ANALYSIS_MARKER}\ntext\n{TREND_EVALUATION_MARKER}\n{{ not json at all"
        );
        let (analysis, assessment) = parse_reply(&reply);
        assert_eq!(analysis, reply);
        assert_eq!(assessment.summary, "Analysis completed");
    }

    #[test]
    fn test_missing_fields_defaulted() {
        let reply = format!(
            "{ANALYSIS_MARKER}\ntext\n{TREND_EVALUATION_MARKER}\n{{\"trend_change_probability\": 42}}"
        );
        let (_, assessment) = parse_reply(&reply);
        assert_eq!(assessment.trend_change_probability, 42.0);
        assert_eq!(assessment.alert_level, AlertLevel::Low);
        assert_eq!(assessment.summary, "No summary");
    }

    #[test]
    fn test_probability_clamped() {
        let reply = format!(
            "{ANALYSIS_MARKER}\ntext\n{TREND_EVALUATION_MARKER}\n{{\"trend_change_probability\": 850}}"
        );
        let (_, assessment) = parse_reply(&reply);
        assert_eq!(assessment.trend_change_probability, 100.0);
    }

    #[test]
    fn test_alert_level_parsing() {
        assert_eq!(AlertLevel::parse("CRITICAL"), AlertLevel::Critical);
        assert_eq!(AlertLevel::parse("High"), AlertLevel::High);
        assert_eq!(AlertLevel::parse("info"), AlertLevel::Info);
        assert_eq!(AlertLevel::parse("whatever"), AlertLevel::Low);
    }

    #[test]
    fn test_alert_level_ordering() {
        assert!(AlertLevel::Critical > AlertLevel::High);
        assert!(AlertLevel::High > AlertLevel::Medium);
        assert!(AlertLevel::Medium > AlertLevel::Low);
        assert!(AlertLevel::Low > AlertLevel::Info);
    }
}
