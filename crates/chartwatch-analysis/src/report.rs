//! Analysis reports
//!
//! Two artifacts are written per symbol, both overwritten on every run:
//! a plain-text report (`combined_analysis_latest.txt`) that also feeds the
//! next run's prior-analysis comparison, and an HTML report
//! (`multi_provider_analysis.html`) for reading in a browser.

use crate::consensus::Consensus;
use crate::engine::ProviderOutcome;
use crate::error::Result;
use chartwatch_capture::ScreenshotSet;
use minijinja::{Environment, context};
use std::path::{Path, PathBuf};

/// Text report filename, overwritten each run
pub const COMBINED_ANALYSIS_FILENAME: &str = "combined_analysis_latest.txt";

/// HTML report filename, overwritten each run
pub const MULTI_PROVIDER_HTML_FILENAME: &str = "multi_provider_analysis.html";

/// Delimiter line the prior-analysis loader slices on
const RESULTS_DELIMITER: &str = "Combined Analysis Results:";

/// Rule printed under the results delimiter
const RESULTS_RULE_LEN: usize = 40;

/// Providers rendered first, in this order; the rest follow as collected
const PREFERRED_ORDER: [&str; 3] = ["claude", "perplexity", "google"];

fn section_title(provider: &str) -> String {
    match provider {
        "google" => "GOOGLE AI ANALYSIS".to_string(),
        other => format!("{} ANALYSIS", other.to_uppercase()),
    }
}

fn html_title(provider: &str) -> String {
    match provider {
        "claude" => "Claude Analysis".to_string(),
        "perplexity" => "Perplexity Analysis".to_string(),
        "google" => "Google AI Analysis".to_string(),
        other => format!("{} Analysis", other.to_uppercase()),
    }
}

/// Outcomes reordered for presentation
fn ordered(outcomes: &[ProviderOutcome]) -> Vec<&ProviderOutcome> {
    let mut result: Vec<&ProviderOutcome> = Vec::with_capacity(outcomes.len());
    for name in PREFERRED_ORDER {
        result.extend(outcomes.iter().filter(|o| o.provider == name));
    }
    result.extend(outcomes.iter().filter(|o| !PREFERRED_ORDER.contains(&o.provider.as_str())));
    result
}

/// Build the combined analysis text: consolidated decision, per-provider
/// sections, and the consensus summary
pub fn combined_text(
    outcomes: &[ProviderOutcome],
    consolidated: Option<&str>,
    consensus: &Consensus,
) -> String {
    let rule = "=".repeat(60);
    let mut lines: Vec<String> = Vec::new();

    if let Some(decision) = consolidated {
        lines.push("CONSOLIDATED TRADING DECISION".to_string());
        lines.push(rule.clone());
        lines.push(decision.trim().to_string());
        lines.push(String::new());
    }

    for outcome in ordered(outcomes) {
        lines.push(section_title(&outcome.provider));
        lines.push(rule.clone());
        lines.push(outcome.analysis.trim().to_string());
        lines.push(String::new());
    }

    lines.push("MULTI-PROVIDER CONSENSUS SUMMARY".to_string());
    lines.push(rule);
    lines.push(format!(
        "Average Trend Change Probability: {:.1}%",
        consensus.trend_change_probability
    ));
    lines.push(format!(
        "Probability Range: {:.1}% - {:.1}%",
        consensus.probability_range.0, consensus.probability_range.1
    ));
    lines.push(format!("Providers Used: {}", consensus.provider_count));
    lines.push(String::new());

    if !consensus.alerts.is_empty() {
        lines.push(format!("Alerts from {} provider(s):", consensus.alerts.len()));
        for alert in &consensus.alerts {
            lines.push(format!(
                "  - {}: {} ({:.0}%) - {}",
                alert.provider,
                alert.alert_level.as_str().to_uppercase(),
                alert.probability,
                alert.summary
            ));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "CONSENSUS: {} | Confidence: {} | Providers: {} | Agreement: {:.1}%",
        consensus.alert_level.as_str().to_uppercase(),
        consensus.confidence_level.to_uppercase(),
        consensus.provider_count,
        consensus.provider_agreement
    ));
    lines.push(format!("SUMMARY: {}", consensus.summary));

    lines.join("\n")
}

/// Write the plain-text report and return its path
pub fn write_text_report(
    dir: &Path,
    screenshots: &ScreenshotSet,
    combined: &str,
    consensus: &Consensus,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(COMBINED_ANALYSIS_FILENAME);

    let mut report = String::new();
    report.push_str("Combined Screenshot Analysis Report\n");
    report.push_str(&"=".repeat(60));
    report.push('\n');
    report.push_str(&format!(
        "Analysis Date: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("Screenshots Analyzed: {}\n\n", screenshots.len()));

    report.push_str("Screenshot Sources:\n");
    report.push_str(&"-".repeat(30));
    report.push('\n');
    for (window, screenshot_path) in screenshots.iter() {
        let file = screenshot_path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        report.push_str(&format!("- {}: {}\n", window.label(), file));
    }

    report.push_str("\nTrend Change Analysis:\n");
    report.push_str(&"-".repeat(30));
    report.push('\n');
    report.push_str(&format!(
        "Trend Change Probability: {:.1}%\n",
        consensus.trend_change_probability
    ));
    report.push_str(&format!(
        "Confidence Level: {}\n",
        consensus.confidence_level.to_uppercase()
    ));
    report.push_str(&format!(
        "Status: {} ({})\n",
        if consensus.has_changes { "ALERT" } else { "NO ALERT" },
        consensus.alert_level.as_str().to_uppercase()
    ));
    report.push_str(&format!("Summary: {}\n\n", consensus.summary));

    report.push_str(RESULTS_DELIMITER);
    report.push('\n');
    report.push_str(&"=".repeat(RESULTS_RULE_LEN));
    report.push('\n');
    report.push_str(combined);
    report.push_str("\n\n");

    std::fs::write(&path, report)?;
    tracing::info!("combined analysis report saved: {}", path.display());
    Ok(path)
}

/// Load the previous run's combined analysis for comparison
///
/// Slices the text report after the results delimiter and its rule line;
/// returns `None` when no report exists or the delimiter is missing.
pub fn load_prior_analysis(dir: &Path) -> Option<String> {
    let path = dir.join(COMBINED_ANALYSIS_FILENAME);
    let content = std::fs::read_to_string(&path).ok()?;

    let delimiter_at = content.find(RESULTS_DELIMITER)?;
    let rule = "=".repeat(RESULTS_RULE_LEN);
    let rule_at = content[delimiter_at..].find(&rule)? + delimiter_at;
    let analysis = content[rule_at + rule.len()..].trim();

    if analysis.is_empty() {
        None
    } else {
        Some(analysis.to_string())
    }
}

const HTML_TEMPLATE: &str = r#"<html>
<head>
    <meta charset='utf-8'>
    <title>Multi-Provider AI Analysis Report for {{ symbol }}</title>
    <style>
        body { font-family: Arial, sans-serif; background: #f8f9fa; color: #222; margin: 0; padding: 0; }
        .container { max-width: 900px; margin: 30px auto; background: #fff; border-radius: 8px; box-shadow: 0 2px 8px #0001; padding: 32px; }
        h1 { text-align: center; font-size: 2.2em; margin-bottom: 0.2em; }
        h2 { border-bottom: 2px solid #eee; padding-bottom: 0.2em; margin-top: 2em; }
        .section { margin: 2em 0; }
        .divider { border-top: 2px solid #bbb; margin: 2em 0; }
        .summary-box { background: #f1f8e9; border-left: 6px solid #4caf50; padding: 1em 1.5em; margin: 1.5em 0; border-radius: 6px; font-size: 1.1em; }
        ul, li { margin-bottom: 0.5em; }
        .alert-list li { margin-bottom: 0.3em; }
        .alert-level { color: #d84315; font-weight: bold; }
        .consensus-low { background: #fff3e0; border-left: 6px solid #ff9800; }
        .consensus-high { background: #e3f2fd; border-left: 6px solid #2196f3; }
        .provider-title { font-size: 1.3em; color: #333; margin-top: 1.5em; }
        .analysis-text { white-space: pre-wrap; font-family: inherit; font-size: 1.08em; background: #f6f8fa; padding: 1em; border-radius: 6px; border: 1px solid #eee; }
        .meta { color: #888; font-size: 0.95em; text-align: right; margin-bottom: 1em; }
    </style>
</head>
<body>
<div class='container'>
    <h1>Multi-Provider AI Analysis Report for {{ symbol }}</h1>
    <div class='meta'>Generated: {{ generated }}</div>
{%- if consolidated %}
    <div class='divider'></div>
    <h2>Consolidated Trading Decision</h2>
    <div class='section'><pre class='analysis-text'>{{ consolidated }}</pre></div>
{%- endif %}
{%- for provider in providers %}
    <div class='divider'></div>
    <div class='provider-title'>{{ provider.title }}</div>
    <div class='section'><pre class='analysis-text'>{{ provider.analysis }}</pre></div>
{%- endfor %}
    <div class='divider'></div>
    <h2>Multi-Provider Consensus Summary</h2>
    <div class='section'>
    <ul><li><b>Average Trend Change Probability:</b> {{ avg_probability }}%</li><li><b>Range:</b> {{ min_probability }}% - {{ max_probability }}%</li></ul>
{%- if alerts %}
    <div><b>Alerts from {{ alerts | length }} provider(s):</b></div>
    <ul class='alert-list'>
{%- for alert in alerts %}
        <li><b>{{ alert.provider }}:</b> <span class='alert-level'>{{ alert.level }}</span> ({{ alert.probability }}%) - {{ alert.summary }}</li>
{%- endfor %}
    </ul>
{%- endif %}
    <div class='summary-box {{ box_class }}'>CONSENSUS: <b>{{ consensus_level }}</b> | Confidence: <b>{{ confidence }}</b>{% if consolidator_decision %} | Consolidator: <b>EMAIL ALERT</b>{% endif %} | Providers: <b>{{ provider_count }}</b> | Agreement: <b>{{ agreement }}%</b><br>SUMMARY: {{ summary }}</div>
    </div>
</div></body></html>
"#;

/// Write the HTML report and return its path
pub fn write_html_report(
    dir: &Path,
    symbol: &str,
    outcomes: &[ProviderOutcome],
    consolidated: Option<&str>,
    consensus: &Consensus,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(MULTI_PROVIDER_HTML_FILENAME);

    let providers: Vec<serde_json::Value> = ordered(outcomes)
        .into_iter()
        .map(|o| {
            serde_json::json!({
                "title": html_title(&o.provider),
                "analysis": o.analysis.trim(),
            })
        })
        .collect();

    let alerts: Vec<serde_json::Value> = consensus
        .alerts
        .iter()
        .map(|a| {
            serde_json::json!({
                "provider": a.provider,
                "level": a.alert_level.as_str().to_uppercase(),
                "probability": format!("{:.0}", a.probability),
                "summary": a.summary,
            })
        })
        .collect();

    // The .html template name switches MiniJinja auto-escaping on
    let mut env = Environment::new();
    env.add_template("report.html", HTML_TEMPLATE)?;
    let rendered = env.get_template("report.html")?.render(context! {
        symbol => symbol,
        generated => chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        consolidated => consolidated.map(str::trim),
        providers => providers,
        alerts => alerts,
        avg_probability => format!("{:.1}", consensus.trend_change_probability),
        min_probability => format!("{:.1}", consensus.probability_range.0),
        max_probability => format!("{:.1}", consensus.probability_range.1),
        consensus_level => consensus.alert_level.as_str().to_uppercase(),
        confidence => consensus.confidence_level.to_uppercase(),
        consolidator_decision => consensus.consolidator_decision,
        provider_count => consensus.provider_count,
        agreement => format!("{:.1}", consensus.provider_agreement),
        summary => consensus.summary,
        box_class => if consensus.has_changes { "consensus-high" } else { "consensus-low" },
    })?;

    std::fs::write(&path, rendered)?;
    tracing::info!("multi-provider HTML report saved: {}", path.display());
    Ok(path)
}
