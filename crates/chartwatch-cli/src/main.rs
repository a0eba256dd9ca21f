//! chartwatch binary
//!
//! Per symbol: capture chart screenshots, fan them out to the enabled LLM
//! providers, consolidate the analyses into one decision, write reports,
//! and email an alert when the consensus calls for one. Runs once or on a
//! market-hours schedule.

mod schedule;
mod symbols;

use anyhow::Context;
use chartwatch_alert::AlertMailer;
use chartwatch_analysis::{
    AnalysisEngine, Consensus, Consolidator, ProviderSettings, combined_text, load_prior_analysis,
    parse_email_decision, write_html_report, write_text_report,
};
use chartwatch_capture::{CaptureConfig, ScreenshotSet};
use chartwatch_llm::providers::GeminiProvider;
use clap::Parser;
use schedule::ScheduleConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Poll cadence while waiting for the market to open
const OUTSIDE_HOURS_POLL: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(name = "chartwatch")]
#[command(about = "Capture trading charts, analyze them with multiple AI providers, and alert on trend changes", long_about = None)]
struct Args {
    /// Run once, ignoring SCHEDULE_ENABLED
    #[arg(long)]
    once: bool,

    /// Comma-separated symbol override (skips stock_symbols.txt)
    #[arg(long)]
    symbols: Option<String>,

    /// Env file to load (default: .env in the working directory)
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    chartwatch_utils::init_tracing();

    let schedule = ScheduleConfig::from_env();
    if args.once || !schedule.enabled {
        info!("running once (scheduled mode off)");
        run_once(&args).await;
        return Ok(());
    }

    info!(
        "scheduled mode enabled: {} - {} {} every {}s",
        schedule.start_time,
        schedule.stop_time,
        schedule.timezone,
        schedule.interval.as_secs()
    );

    let mut run_count: u64 = 0;
    loop {
        if schedule.within_market_hours() {
            run_count += 1;
            info!("run #{run_count} starting");
            run_once(&args).await;
            info!("next run in {}s", schedule.interval.as_secs());
            if wait_or_shutdown(schedule.interval).await {
                break;
            }
        } else {
            info!(
                "outside market hours ({} - {} {}), checking again in {}s",
                schedule.start_time,
                schedule.stop_time,
                schedule.timezone,
                OUTSIDE_HOURS_POLL.as_secs()
            );
            if wait_or_shutdown(OUTSIDE_HOURS_POLL).await {
                break;
            }
        }
    }

    info!("stopped after {run_count} runs");
    Ok(())
}

/// Sleep for the given duration; returns true when ctrl-c arrived instead
async fn wait_or_shutdown(duration: Duration) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => false,
        _ = tokio::signal::ctrl_c() => true,
    }
}

/// One pass over every configured symbol
async fn run_once(args: &Args) {
    let symbols = match &args.symbols {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => symbols::load_symbols(std::path::Path::new(symbols::SYMBOLS_FILE)),
    };

    let capture_config = match CaptureConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid capture configuration: {e}");
            return;
        }
    };
    let settings = ProviderSettings::from_env();

    info!("processing {} symbols: {}", symbols.len(), symbols.join(", "));

    for symbol in &symbols {
        info!("processing symbol: {symbol}");
        if let Err(e) = process_symbol(symbol, &capture_config, &settings).await {
            warn!("{symbol}: {e:#}");
        }
    }

    info!("all symbols processed");
}

/// Capture, analyze, consolidate, report, and alert for one symbol
async fn process_symbol(
    symbol: &str,
    capture_config: &CaptureConfig,
    settings: &ProviderSettings,
) -> anyhow::Result<()> {
    let screenshots = capture(symbol, capture_config).await?;
    if screenshots.valid().is_empty() {
        anyhow::bail!("no screenshots available");
    }

    if settings.is_empty() {
        info!("{symbol}: no AI providers enabled, capture only");
        return Ok(());
    }

    let folder = capture_config.screenshot_dir.join(symbol);
    let engine = AnalysisEngine::from_settings(settings)?;
    info!(
        "{symbol}: analyzing with providers: {}",
        engine.provider_names().join(", ")
    );

    let outcomes = engine.analyze(&screenshots, symbol).await?;
    if outcomes.is_empty() {
        anyhow::bail!("no successful analyses from any provider");
    }

    // Prior analysis enters at consolidation only; the next run reads the
    // report this run writes.
    let prior = load_prior_analysis(&folder);

    let consolidated = match &settings.google_consolidation {
        Some(slot) => {
            let provider = GeminiProvider::new(slot.api_key.clone())?;
            let consolidator = Consolidator::new(Arc::new(provider), slot.model.clone());
            Some(
                consolidator
                    .consolidate(symbol, &outcomes, prior.as_deref())
                    .await,
            )
        }
        None => None,
    };

    let email_requested = consolidated
        .as_deref()
        .is_some_and(parse_email_decision);

    let consensus = Consensus::compute(&outcomes, email_requested);
    let combined = combined_text(&outcomes, consolidated.as_deref(), &consensus);

    write_text_report(&folder, &screenshots, &combined, &consensus)?;
    write_html_report(&folder, symbol, &outcomes, consolidated.as_deref(), &consensus)?;

    let mailer = AlertMailer::from_env();
    if consensus.has_changes {
        let sent = mailer
            .send_trend_alert(&consensus, &combined, Some(symbol))
            .await?;
        if sent {
            info!(
                "{symbol}: alert handled ({} / {:.1}%)",
                consensus.alert_level, consensus.trend_change_probability
            );
        }
    } else {
        info!(
            "{symbol}: no significant changes (probability {:.1}%)",
            consensus.trend_change_probability
        );
    }

    Ok(())
}

/// Capture screenshots with the desktop backend
#[cfg(feature = "desktop")]
async fn capture(symbol: &str, config: &CaptureConfig) -> anyhow::Result<ScreenshotSet> {
    use chartwatch_capture::{CaptureSession, DesktopDriver};

    let session = CaptureSession::new(DesktopDriver::new(), config.clone());
    Ok(session.capture_symbol(symbol).await?)
}

/// Without the desktop backend, pick up screenshots already on disk
#[cfg(not(feature = "desktop"))]
async fn capture(symbol: &str, config: &CaptureConfig) -> anyhow::Result<ScreenshotSet> {
    warn!("built without the desktop feature, reusing existing screenshots only");

    let folder = config.screenshot_dir.join(symbol);
    let mut set = ScreenshotSet::new();
    for window in config.enabled_windows() {
        let path = folder.join(config.screenshot_filename(window, symbol));
        if path.exists() {
            set.insert(window, path);
        }
    }
    Ok(set)
}
