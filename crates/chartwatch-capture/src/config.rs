//! Configuration for capture operations

use crate::error::{CaptureError, Result};
use crate::window::ChartWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// A screen coordinate pair for focus clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// Recorded focus-click positions; resolution-specific by nature and
// overridable through the config builder.
const TRADINGVIEW_CENTER: Point = Point::new(1280, 800);
const TRADINGVIEW_FOCUS: Point = Point::new(2523, 714);
const SYMBOLIK_FOCUS: Point = Point::new(1900, 390);

/// Configuration for capture operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Capture the TradingView windows at all
    pub tradingview_enabled: bool,

    /// Capture the Symbolik workspace at all
    pub symbolik_enabled: bool,

    /// Window-title keywords, per window
    pub title_keywords: HashMap<ChartWindow, String>,

    /// Screenshot filename patterns (`{symbol}` placeholder), per window
    pub filename_patterns: HashMap<ChartWindow, String>,

    /// Root directory for screenshots (a per-symbol subdirectory is created)
    pub screenshot_dir: PathBuf,

    /// Delay after focusing a window before interacting with it
    pub window_settle_delay: Duration,

    /// Delay after the focus click before typing
    pub focus_click_delay: Duration,

    /// Chart load delay for TradingView tabs 1-3
    pub chart_load_delay: Duration,

    /// Chart load delay for TradingView tab 4 (heavier layout)
    pub chart_load_delay_tab4: Duration,

    /// Wait after submitting the Symbolik symbol query
    pub symbolik_wait_delay: Duration,

    /// Wait after a refresh triggered by a blank Symbolik frame
    pub symbolik_refresh_wait: Duration,

    /// Reuse screenshots already on disk instead of recapturing
    pub reuse_existing: bool,

    /// Focus click for TradingView tab 1 (window center)
    pub tradingview_center: Point,

    /// Focus click for TradingView tabs 2-4 (far right edge)
    pub tradingview_focus: Point,

    /// Focus click for the Symbolik workspace
    pub symbolik_focus: Point,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let title_keywords = ChartWindow::ALL
            .into_iter()
            .map(|w| (w, w.default_title_keyword().to_string()))
            .collect();
        let filename_patterns = ChartWindow::ALL
            .into_iter()
            .map(|w| (w, w.default_filename_pattern().to_string()))
            .collect();

        Self {
            tradingview_enabled: true,
            symbolik_enabled: true,
            title_keywords,
            filename_patterns,
            screenshot_dir: PathBuf::from("screenshots"),
            window_settle_delay: Duration::from_secs(3),
            focus_click_delay: Duration::from_millis(1500),
            chart_load_delay: Duration::from_secs(5),
            chart_load_delay_tab4: Duration::from_secs(15),
            symbolik_wait_delay: Duration::from_secs(5),
            symbolik_refresh_wait: Duration::from_secs(5),
            reuse_existing: false,
            tradingview_center: TRADINGVIEW_CENTER,
            tradingview_focus: TRADINGVIEW_FOCUS,
            symbolik_focus: SYMBOLIK_FOCUS,
        }
    }
}

impl CaptureConfig {
    /// Create a new configuration builder
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }

    /// Load configuration overrides from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.tradingview_enabled = env_bool("TRADINGVIEW_ENABLED", true);
        config.symbolik_enabled = env_bool("SYMBOLIK_ENABLED", true);
        config.reuse_existing = env_bool("REUSE_EXISTING_SCREENSHOTS", false);

        for (var, window) in [
            ("TRADINGVIEW_WINDOW1", ChartWindow::TrendAnalysis),
            ("TRADINGVIEW_WINDOW2", ChartWindow::HeikenAshi),
            ("TRADINGVIEW_WINDOW3", ChartWindow::VolumeLayout),
            ("TRADINGVIEW_WINDOW4", ChartWindow::VolumeProfile),
            ("SYMBOLIK_WINDOW", ChartWindow::Workspace),
        ] {
            if let Ok(title) = std::env::var(var) {
                config.title_keywords.insert(window, title);
            }
        }

        for (var, window) in [
            ("SCREENSHOT_NAME_TAB1", ChartWindow::TrendAnalysis),
            ("SCREENSHOT_NAME_TAB2", ChartWindow::HeikenAshi),
            ("SCREENSHOT_NAME_TAB3", ChartWindow::VolumeLayout),
            ("SCREENSHOT_NAME_TAB4", ChartWindow::VolumeProfile),
            ("SCREENSHOT_NAME_SYMBOLIK", ChartWindow::Workspace),
        ] {
            if let Ok(pattern) = std::env::var(var) {
                config.filename_patterns.insert(window, pattern);
            }
        }

        if let Ok(dir) = std::env::var("SCREENSHOT_DIR") {
            config.screenshot_dir = PathBuf::from(dir);
        }

        config.window_settle_delay = env_secs("WINDOW_SETTLE_DELAY", 3.0);
        config.focus_click_delay = env_secs("FOCUS_CLICK_DELAY", 1.5);
        config.chart_load_delay = env_secs("CHART_LOAD_DELAY_TAB1_3", 5.0);
        config.chart_load_delay_tab4 = env_secs("CHART_LOAD_DELAY_TAB4", 15.0);
        config.symbolik_wait_delay = env_secs("SYMBOLIK_WAIT_DELAY", 5.0);
        config.symbolik_refresh_wait = env_secs("SYMBOLIK_REFRESH_WAIT", 5.0);

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.tradingview_enabled && !self.symbolik_enabled {
            return Err(CaptureError::Config(
                "all capture sources disabled".to_string(),
            ));
        }

        for window in self.enabled_windows() {
            match self.title_keywords.get(&window) {
                Some(title) if !title.trim().is_empty() => {}
                _ => {
                    return Err(CaptureError::Config(format!(
                        "empty window title keyword for {window}"
                    )));
                }
            }
            match self.filename_patterns.get(&window) {
                Some(pattern) if pattern.contains("{symbol}") => {}
                _ => {
                    return Err(CaptureError::Config(format!(
                        "filename pattern for {window} must contain {{symbol}}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Windows enabled by this configuration, in capture order
    pub fn enabled_windows(&self) -> Vec<ChartWindow> {
        let mut windows = Vec::new();
        if self.tradingview_enabled {
            windows.extend(ChartWindow::TRADINGVIEW);
        }
        if self.symbolik_enabled {
            windows.push(ChartWindow::Workspace);
        }
        windows
    }

    /// Title keyword for a window
    pub fn title_keyword(&self, window: ChartWindow) -> &str {
        self.title_keywords
            .get(&window)
            .map_or_else(|| window.default_title_keyword(), String::as_str)
    }

    /// Screenshot filename for a window and symbol
    pub fn screenshot_filename(&self, window: ChartWindow, symbol: &str) -> String {
        self.filename_patterns
            .get(&window)
            .map_or_else(|| window.default_filename_pattern(), String::as_str)
            .replace("{symbol}", symbol)
    }

    /// Chart load delay for a window
    pub fn load_delay(&self, window: ChartWindow) -> Duration {
        match window {
            ChartWindow::VolumeProfile => self.chart_load_delay_tab4,
            ChartWindow::Workspace => self.symbolik_wait_delay,
            _ => self.chart_load_delay,
        }
    }

    /// Focus-click position for a window
    pub fn focus_point(&self, window: ChartWindow) -> Point {
        match window {
            ChartWindow::TrendAnalysis => self.tradingview_center,
            ChartWindow::Workspace => self.symbolik_focus,
            _ => self.tradingview_focus,
        }
    }
}

fn env_bool(var: &str, default: bool) -> bool {
    std::env::var(var).map_or(default, |v| v.eq_ignore_ascii_case("true"))
}

fn env_secs(var: &str, default: f64) -> Duration {
    let secs = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default);
    Duration::from_secs_f64(secs.max(0.0))
}

/// Builder for CaptureConfig
#[derive(Debug, Default)]
pub struct CaptureConfigBuilder {
    config: CaptureConfig,
}

impl CaptureConfigBuilder {
    /// Enable or disable the TradingView windows
    pub fn tradingview_enabled(mut self, enabled: bool) -> Self {
        self.config.tradingview_enabled = enabled;
        self
    }

    /// Enable or disable the Symbolik workspace
    pub fn symbolik_enabled(mut self, enabled: bool) -> Self {
        self.config.symbolik_enabled = enabled;
        self
    }

    /// Override a window title keyword
    pub fn title_keyword(mut self, window: ChartWindow, keyword: impl Into<String>) -> Self {
        self.config.title_keywords.insert(window, keyword.into());
        self
    }

    /// Override a screenshot filename pattern
    pub fn filename_pattern(mut self, window: ChartWindow, pattern: impl Into<String>) -> Self {
        self.config
            .filename_patterns
            .insert(window, pattern.into());
        self
    }

    /// Set the screenshot root directory
    pub fn screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.screenshot_dir = dir.into();
        self
    }

    /// Set the window settle delay
    pub fn window_settle_delay(mut self, delay: Duration) -> Self {
        self.config.window_settle_delay = delay;
        self
    }

    /// Set the focus click delay
    pub fn focus_click_delay(mut self, delay: Duration) -> Self {
        self.config.focus_click_delay = delay;
        self
    }

    /// Set the chart load delay for tabs 1-3
    pub fn chart_load_delay(mut self, delay: Duration) -> Self {
        self.config.chart_load_delay = delay;
        self
    }

    /// Set the chart load delay for tab 4
    pub fn chart_load_delay_tab4(mut self, delay: Duration) -> Self {
        self.config.chart_load_delay_tab4 = delay;
        self
    }

    /// Set the Symbolik wait delay
    pub fn symbolik_wait_delay(mut self, delay: Duration) -> Self {
        self.config.symbolik_wait_delay = delay;
        self
    }

    /// Set the Symbolik refresh wait
    pub fn symbolik_refresh_wait(mut self, delay: Duration) -> Self {
        self.config.symbolik_refresh_wait = delay;
        self
    }

    /// Reuse screenshots already on disk
    pub fn reuse_existing(mut self, reuse: bool) -> Self {
        self.config.reuse_existing = reuse;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<CaptureConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();
        assert!(config.tradingview_enabled);
        assert!(config.symbolik_enabled);
        assert_eq!(config.enabled_windows().len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = CaptureConfig::builder()
            .symbolik_enabled(false)
            .chart_load_delay(Duration::from_secs(2))
            .screenshot_dir("/tmp/shots")
            .build()
            .unwrap();

        assert_eq!(config.enabled_windows().len(), 4);
        assert_eq!(config.chart_load_delay, Duration::from_secs(2));
        assert_eq!(config.screenshot_dir, PathBuf::from("/tmp/shots"));
    }

    #[test]
    fn test_all_sources_disabled_rejected() {
        let result = CaptureConfig::builder()
            .tradingview_enabled(false)
            .symbolik_enabled(false)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_filename_pattern_requires_placeholder() {
        let result = CaptureConfig::builder()
            .filename_pattern(ChartWindow::TrendAnalysis, "fixed.png")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_screenshot_filename() {
        let config = CaptureConfig::default();
        assert_eq!(
            config.screenshot_filename(ChartWindow::TrendAnalysis, "qbts"),
            "qbts_tab1.png"
        );
        assert_eq!(
            config.screenshot_filename(ChartWindow::Workspace, "qbts"),
            "qbts_symbolik.png"
        );
    }

    #[test]
    fn test_load_delay_tab4_is_longer() {
        let config = CaptureConfig::default();
        assert!(
            config.load_delay(ChartWindow::VolumeProfile)
                > config.load_delay(ChartWindow::VolumeLayout)
        );
    }

    #[test]
    fn test_focus_points() {
        let config = CaptureConfig::default();
        assert_eq!(
            config.focus_point(ChartWindow::TrendAnalysis),
            config.tradingview_center
        );
        assert_eq!(
            config.focus_point(ChartWindow::HeikenAshi),
            config.tradingview_focus
        );
        assert_eq!(
            config.focus_point(ChartWindow::Workspace),
            config.symbolik_focus
        );
    }
}
