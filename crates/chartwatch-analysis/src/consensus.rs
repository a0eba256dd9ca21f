//! Consensus and alert-decision logic
//!
//! Merges heterogeneous provider assessments into one picture: probability
//! statistics, the alert subset, a local voting fallback for the trading
//! decision, the email-decision text heuristics, and the final consensus
//! record the alert mailer consumes.

use crate::assessment::AlertLevel;
use crate::engine::ProviderOutcome;
use serde::{Deserialize, Serialize};

/// Vote thresholds on the 0-100 probability scale
const BUY_PROBABILITY: f64 = 70.0;
const SELL_PROBABILITY: f64 = 30.0;

/// Probability banding for the local decision text
const HIGH_PROBABILITY_BAND: f64 = 60.0;
const MODERATE_PROBABILITY_BAND: f64 = 40.0;

/// Consensus probability above which a consolidator-driven alert without
/// provider alerts is ranked medium instead of low
const MEDIUM_ALERT_PROBABILITY: f64 = 50.0;

/// A provider's trading vote derived from its assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        })
    }
}

/// Map one outcome to a vote
///
/// Only assessments flagged as changed vote directionally; a high alert or
/// high probability votes Buy, a low alert or low probability votes Sell,
/// everything else holds.
fn vote_for(outcome: &ProviderOutcome) -> Vote {
    let assessment = &outcome.assessment;
    if !assessment.has_changes {
        return Vote::Hold;
    }
    if assessment.alert_level >= AlertLevel::High
        || assessment.trend_change_probability > BUY_PROBABILITY
    {
        Vote::Buy
    } else if assessment.alert_level <= AlertLevel::Low
        || assessment.trend_change_probability < SELL_PROBABILITY
    {
        Vote::Sell
    } else {
        Vote::Hold
    }
}

/// Local consolidated decision, used when the consolidation model is
/// unavailable or disabled
pub fn local_consolidated_decision(outcomes: &[ProviderOutcome], symbol: &str) -> String {
    let votes: Vec<Vote> = outcomes.iter().map(vote_for).collect();
    let buy = votes.iter().filter(|v| **v == Vote::Buy).count();
    let sell = votes.iter().filter(|v| **v == Vote::Sell).count();
    let hold = votes.iter().filter(|v| **v == Vote::Hold).count();

    let (decision, strength) = if buy > sell && buy > hold {
        (Vote::Buy, buy)
    } else if sell > buy && sell > hold {
        (Vote::Sell, sell)
    } else {
        (Vote::Hold, hold)
    };

    let avg_probability = average_probability(outcomes);

    let mut text = String::new();
    let rule = "=".repeat(50);
    text.push_str(&format!("\n{rule}\n"));
    text.push_str(&format!("LOCAL CONSOLIDATED TRADING DECISION FOR {symbol}\n"));
    text.push_str(&format!("{rule}\n\n"));
    text.push_str(&format!("TRADING DECISION: {decision}\n"));
    text.push_str(&format!(
        "Provider Consensus: {strength}/{} providers agree\n",
        outcomes.len()
    ));
    text.push_str(&format!("Average Confidence: {avg_probability:.1}%\n\n"));

    text.push_str("TREND CHANGE EVALUATION:\n");
    if avg_probability > HIGH_PROBABILITY_BAND {
        text.push_str(&format!(
            "High probability ({avg_probability:.1}%) of significant trend change\n"
        ));
    } else if avg_probability > MODERATE_PROBABILITY_BAND {
        text.push_str(&format!(
            "Moderate probability ({avg_probability:.1}%) of trend change\n"
        ));
    } else {
        text.push_str(&format!(
            "Low probability ({avg_probability:.1}%) of trend change\n"
        ));
    }

    text.push_str("\nProvider Breakdown:\n");
    for (outcome, vote) in outcomes.iter().zip(&votes) {
        text.push_str(&format!(
            "- {}: {vote} (probability: {:.1}%)\n",
            outcome.provider, outcome.assessment.trend_change_probability
        ));
    }
    text.push_str(&format!("\n{rule}\n"));

    text
}

// Explicit decision phrases checked first, affirmative before negative
const YES_PATTERNS: [&str; 8] = [
    "EMAIL ALERT DECISION: YES",
    "EMAIL ALERT DECISION:YES",
    "SEND EMAIL ALERT",
    "EMAIL: YES",
    "ALERT: YES",
    "RECOMMENDATION: SEND EMAIL",
    "SHOULD SEND EMAIL",
    "ALERT RECOMMENDED",
];

const NO_PATTERNS: [&str; 9] = [
    "EMAIL ALERT DECISION: NO",
    "EMAIL ALERT DECISION:NO",
    "DO NOT SEND EMAIL",
    "DON'T SEND EMAIL",
    "EMAIL: NO",
    "ALERT: NO",
    "NO EMAIL NEEDED",
    "NOT ALERT",
    "NO ALERT NEEDED",
];

const BULLISH_KEYWORDS: [&str; 9] = [
    "BUY",
    "STRONG BUY",
    "BULLISH",
    "UPTREND",
    "SIGNAL",
    "ALERT",
    "OPPORTUNITY",
    "REVERSAL UP",
    "BREAKOUT",
];

const BEARISH_KEYWORDS: [&str; 8] = [
    "SELL",
    "STRONG SELL",
    "BEARISH",
    "DOWNTREND",
    "WARNING",
    "CAUTION",
    "REVERSAL DOWN",
    "BREAKDOWN",
];

/// Parse the consolidated decision text for an email alert decision
///
/// Explicit YES/NO phrases win; otherwise keyword heuristics apply, and an
/// unclear text defaults to no alert.
pub fn parse_email_decision(decision_text: &str) -> bool {
    if decision_text.is_empty() {
        return false;
    }

    let text = decision_text.to_uppercase();

    for pattern in YES_PATTERNS {
        if text.contains(pattern) {
            tracing::info!("email decision: SEND (matched pattern: '{pattern}')");
            return true;
        }
    }
    for pattern in NO_PATTERNS {
        if text.contains(pattern) {
            tracing::info!("email decision: DO NOT SEND (matched pattern: '{pattern}')");
            return false;
        }
    }

    let bullish = BULLISH_KEYWORDS.iter().filter(|k| text.contains(*k)).count();
    let bearish = BEARISH_KEYWORDS.iter().filter(|k| text.contains(*k)).count();

    if (text.contains("ALERT") || text.contains("SIGNAL")) && bullish > bearish {
        tracing::info!("email decision: SEND (bullish signals with alert keywords)");
        return true;
    }
    if (text.contains("WARNING") || text.contains("CAUTION")) && bearish > 0 {
        tracing::info!("email decision: SEND (bearish warnings)");
        return true;
    }

    tracing::info!("email decision: unclear, defaulting to NO");
    false
}

/// One provider's alert contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAlert {
    pub provider: String,
    pub alert_level: AlertLevel,
    pub summary: String,
    pub probability: f64,
}

/// Final consensus over all provider assessments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consensus {
    /// Whether anything alert-worthy was found (drives the email alert)
    pub has_changes: bool,
    /// Highest alert level across contributors
    pub alert_level: AlertLevel,
    /// Consensus summary line
    pub summary: String,
    /// Average trend-change probability across providers
    pub trend_change_probability: f64,
    /// Min/max probability across providers
    pub probability_range: (f64, f64),
    /// Consensus confidence label
    pub confidence_level: String,
    /// Number of providers that produced an analysis
    pub provider_count: usize,
    /// Percentage of providers that flagged changes
    pub provider_agreement: f64,
    /// Whether the consolidation model made the email decision
    pub consolidator_decision: bool,
    /// Individual provider alerts
    pub alerts: Vec<ProviderAlert>,
}

impl Consensus {
    /// Compute the consensus over provider outcomes
    ///
    /// `email_requested` is the consolidation model's explicit decision; it
    /// overrides the per-provider alert consensus.
    pub fn compute(outcomes: &[ProviderOutcome], email_requested: bool) -> Self {
        let avg = average_probability(outcomes);
        let (min, max) = probability_range(outcomes);

        let alerts: Vec<ProviderAlert> = outcomes
            .iter()
            .filter(|o| o.assessment.has_changes)
            .map(|o| ProviderAlert {
                provider: o.provider.clone(),
                alert_level: o.assessment.alert_level,
                summary: o.assessment.summary.clone(),
                probability: o.assessment.trend_change_probability,
            })
            .collect();

        let provider_count = outcomes.len();
        let agreement = if provider_count == 0 || alerts.is_empty() {
            0.0
        } else {
            alerts.len() as f64 / provider_count as f64 * 100.0
        };

        let max_alert = alerts.iter().max_by_key(|a| a.alert_level).cloned();

        if email_requested {
            // The consolidator asked for an alert; rank it by whatever the
            // providers flagged, or by the average probability alone.
            let (alert_level, summary) = match &max_alert {
                Some(alert) => (
                    alert.alert_level,
                    format!("Consolidator consensus: {}", alert.summary),
                ),
                None => (
                    if avg >= MEDIUM_ALERT_PROBABILITY {
                        AlertLevel::Medium
                    } else {
                        AlertLevel::Low
                    },
                    "Consolidated analysis flagged significant market conditions requiring attention"
                        .to_string(),
                ),
            };
            Self {
                has_changes: true,
                alert_level,
                summary,
                trend_change_probability: avg,
                probability_range: (min, max),
                confidence_level: "high".to_string(),
                provider_count,
                provider_agreement: agreement,
                consolidator_decision: true,
                alerts,
            }
        } else if let Some(alert) = max_alert {
            Self {
                has_changes: true,
                alert_level: alert.alert_level,
                summary: format!(
                    "Consensus from {provider_count} providers: {}",
                    alert.summary
                ),
                trend_change_probability: avg,
                probability_range: (min, max),
                confidence_level: "high".to_string(),
                provider_count,
                provider_agreement: agreement,
                consolidator_decision: false,
                alerts,
            }
        } else {
            Self {
                has_changes: false,
                alert_level: AlertLevel::Low,
                summary: format!("No significant changes detected by {provider_count} providers"),
                trend_change_probability: avg,
                probability_range: (min, max),
                confidence_level: "medium".to_string(),
                provider_count,
                provider_agreement: 0.0,
                consolidator_decision: false,
                alerts,
            }
        }
    }
}

fn average_probability(outcomes: &[ProviderOutcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes
        .iter()
        .map(|o| o.assessment.trend_change_probability)
        .sum::<f64>()
        / outcomes.len() as f64
}

fn probability_range(outcomes: &[ProviderOutcome]) -> (f64, f64) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for outcome in outcomes {
        let p = outcome.assessment.trend_change_probability;
        min = min.min(p);
        max = max.max(p);
    }
    if outcomes.is_empty() { (0.0, 0.0) } else { (min, max) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::TrendAssessment;

    fn outcome(provider: &str, level: AlertLevel, probability: f64, has_changes: bool) -> ProviderOutcome {
        ProviderOutcome {
            provider: provider.to_string(),
            analysis: format!("{provider} analysis"),
            assessment: TrendAssessment {
                alert_level: level,
                trend_change_probability: probability,
                confidence_level: "high".to_string(),
                summary: format!("{provider} summary"),
                key_changes: vec![],
                probability_reasoning: String::new(),
                has_changes,
            },
        }
    }

    #[test]
    fn test_votes() {
        assert_eq!(
            vote_for(&outcome("a", AlertLevel::High, 50.0, true)),
            Vote::Buy
        );
        assert_eq!(
            vote_for(&outcome("a", AlertLevel::Medium, 80.0, true)),
            Vote::Buy
        );
        assert_eq!(
            vote_for(&outcome("a", AlertLevel::Low, 50.0, true)),
            Vote::Sell
        );
        assert_eq!(
            vote_for(&outcome("a", AlertLevel::Medium, 20.0, true)),
            Vote::Sell
        );
        assert_eq!(
            vote_for(&outcome("a", AlertLevel::Medium, 50.0, true)),
            Vote::Hold
        );
        // No flagged changes always holds
        assert_eq!(
            vote_for(&outcome("a", AlertLevel::High, 90.0, false)),
            Vote::Hold
        );
    }

    #[test]
    fn test_local_decision_majority_buy() {
        let outcomes = vec![
            outcome("claude", AlertLevel::High, 80.0, true),
            outcome("perplexity", AlertLevel::High, 75.0, true),
            outcome("grok", AlertLevel::Medium, 50.0, true),
        ];
        let text = local_consolidated_decision(&outcomes, "QBTS");

        assert!(text.contains("LOCAL CONSOLIDATED TRADING DECISION FOR QBTS"));
        assert!(text.contains("TRADING DECISION: BUY"));
        assert!(text.contains("2/3 providers agree"));
        assert!(text.contains("High probability"));
        assert!(text.contains("- claude: BUY"));
    }

    #[test]
    fn test_local_decision_defaults_to_hold() {
        let outcomes = vec![
            outcome("claude", AlertLevel::Medium, 50.0, false),
            outcome("perplexity", AlertLevel::Medium, 20.0, false),
        ];
        let text = local_consolidated_decision(&outcomes, "QBTS");
        assert!(text.contains("TRADING DECISION: HOLD"));
        assert!(text.contains("Low probability"));
    }

    #[test]
    fn test_explicit_yes_decision() {
        assert!(parse_email_decision(
            "**EMAIL ALERT DECISION: YES**\n**REASON:** breakout"
        ));
        assert!(parse_email_decision("We SHOULD SEND EMAIL for this."));
    }

    #[test]
    fn test_explicit_no_decision() {
        assert!(!parse_email_decision("EMAIL ALERT DECISION: NO"));
        assert!(!parse_email_decision("No email needed today"));
    }

    #[test]
    fn test_bullish_heuristic() {
        // Alert keyword plus more bullish than bearish terms
        assert!(parse_email_decision(
            "Strong BUY signal with BULLISH BREAKOUT, ALERT conditions met"
        ));
    }

    #[test]
    fn test_bearish_warning_heuristic() {
        assert!(parse_email_decision("WARNING: BEARISH DOWNTREND forming"));
    }

    #[test]
    fn test_unclear_defaults_to_no() {
        assert!(!parse_email_decision("The market did things today."));
        assert!(!parse_email_decision(""));
    }

    #[test]
    fn test_consensus_consolidator_override() {
        // No provider flagged changes, but the consolidator wants an email
        let outcomes = vec![
            outcome("claude", AlertLevel::Low, 60.0, false),
            outcome("perplexity", AlertLevel::Low, 50.0, false),
        ];
        let consensus = Consensus::compute(&outcomes, true);

        assert!(consensus.has_changes);
        assert!(consensus.consolidator_decision);
        assert_eq!(consensus.alert_level, AlertLevel::Medium); // avg 55 >= 50
        assert_eq!(consensus.trend_change_probability, 55.0);
        assert_eq!(consensus.confidence_level, "high");
    }

    #[test]
    fn test_consensus_provider_alerts_without_consolidator() {
        let outcomes = vec![
            outcome("claude", AlertLevel::High, 80.0, true),
            outcome("perplexity", AlertLevel::Medium, 60.0, true),
            outcome("grok", AlertLevel::Low, 10.0, false),
        ];
        let consensus = Consensus::compute(&outcomes, false);

        assert!(consensus.has_changes);
        assert!(!consensus.consolidator_decision);
        assert_eq!(consensus.alert_level, AlertLevel::High);
        assert_eq!(consensus.alerts.len(), 2);
        assert!((consensus.provider_agreement - 66.666).abs() < 0.01);
        assert!(consensus.summary.contains("claude summary"));
    }

    #[test]
    fn test_consensus_quiet_run() {
        let outcomes = vec![outcome("claude", AlertLevel::Low, 10.0, false)];
        let consensus = Consensus::compute(&outcomes, false);

        assert!(!consensus.has_changes);
        assert_eq!(consensus.alert_level, AlertLevel::Low);
        assert_eq!(consensus.provider_agreement, 0.0);
        assert_eq!(consensus.confidence_level, "medium");
        assert_eq!(consensus.probability_range, (10.0, 10.0));
    }
}
