//! Per-symbol capture orchestration
//!
//! The session walks every enabled window for a symbol: focus the window,
//! click to grab keyboard focus, type the symbol, submit, wait for the
//! chart to render, screenshot. The Symbolik workspace adds the `.bz`
//! suffix, a dropdown selection, and a blank-frame refresh retry.

use crate::config::CaptureConfig;
use crate::driver::{Key, ScreenDriver};
use crate::error::Result;
use crate::window::ChartWindow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

// Symbolik dropdown timing; the suggestion list needs a beat to populate
// before the arrow-down selection lands.
const DROPDOWN_POPULATE_DELAY: Duration = Duration::from_secs(1);
const DROPDOWN_SELECT_DELAY: Duration = Duration::from_millis(300);

/// Screenshots captured for one symbol, in capture order
#[derive(Debug, Default, Clone)]
pub struct ScreenshotSet {
    entries: Vec<(ChartWindow, PathBuf)>,
}

impl ScreenshotSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a screenshot for a window
    pub fn insert(&mut self, window: ChartWindow, path: PathBuf) {
        self.entries.retain(|(w, _)| *w != window);
        self.entries.push((window, path));
    }

    /// Path recorded for a window, if any
    pub fn get(&self, window: ChartWindow) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(w, _)| *w == window)
            .map(|(_, p)| p.as_path())
    }

    /// Iterate over all recorded entries
    pub fn iter(&self) -> impl Iterator<Item = (ChartWindow, &Path)> {
        self.entries.iter().map(|(w, p)| (*w, p.as_path()))
    }

    /// Entries whose file actually exists on disk
    pub fn valid(&self) -> Vec<(ChartWindow, &Path)> {
        self.iter().filter(|(_, p)| p.exists()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drives a [`ScreenDriver`] through the capture plan for a symbol
pub struct CaptureSession<D: ScreenDriver> {
    driver: D,
    config: CaptureConfig,
}

impl<D: ScreenDriver> CaptureSession<D> {
    /// Create a session over a driver and configuration
    pub fn new(driver: D, config: CaptureConfig) -> Self {
        Self { driver, config }
    }

    /// Get the session configuration
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Capture every enabled window for a symbol
    ///
    /// A window that cannot be found or fails to capture is skipped with a
    /// warning; the returned set holds whatever succeeded. The per-symbol
    /// subdirectory is created on demand.
    pub async fn capture_symbol(&self, symbol: &str) -> Result<ScreenshotSet> {
        let folder = self.config.screenshot_dir.join(symbol);
        std::fs::create_dir_all(&folder)?;

        let mut set = ScreenshotSet::new();

        for window in self.config.enabled_windows() {
            let filename = self.config.screenshot_filename(window, symbol);
            let path = folder.join(&filename);

            if self.config.reuse_existing && path.exists() {
                info!("{window}: reusing existing screenshot {}", path.display());
                set.insert(window, path);
                continue;
            }

            let captured = if window == ChartWindow::Workspace {
                self.capture_workspace(symbol, &path).await
            } else {
                self.capture_chart_window(window, symbol, &path).await
            };

            match captured {
                Ok(true) => {
                    info!("{window}: saved {}", path.display());
                    set.insert(window, path);
                }
                Ok(false) => {
                    warn!(
                        "{window}: window '{}' not found, skipping",
                        self.config.title_keyword(window)
                    );
                }
                Err(e) => warn!("{window}: capture failed: {e}"),
            }
        }

        Ok(set)
    }

    /// Focus a TradingView window, type the symbol, and screenshot it
    async fn capture_chart_window(
        &self,
        window: ChartWindow,
        symbol: &str,
        path: &Path,
    ) -> Result<bool> {
        if !self
            .driver
            .focus_window(self.config.title_keyword(window))
            .await?
        {
            return Ok(false);
        }
        sleep(self.config.window_settle_delay).await;

        let point = self.config.focus_point(window);
        self.driver.click(point.x, point.y).await?;
        sleep(self.config.focus_click_delay).await;

        debug!("{window}: typing symbol {symbol}");
        self.driver.type_text(&symbol.to_lowercase()).await?;
        self.driver.press(Key::Enter).await?;

        sleep(self.config.load_delay(window)).await;

        let frame = self.driver.capture_frame().await?;
        frame.save_png(path)?;
        Ok(true)
    }

    /// Navigate the Symbolik workspace and screenshot it
    ///
    /// The symbol is queried as `{symbol}.bz` through the search dropdown.
    /// A blank (near-white) capture triggers one F5 refresh and recapture.
    async fn capture_workspace(&self, symbol: &str, path: &Path) -> Result<bool> {
        if !self
            .driver
            .focus_window(self.config.title_keyword(ChartWindow::Workspace))
            .await?
        {
            warn!(
                "open a browser with '{}' in the title",
                self.config.title_keyword(ChartWindow::Workspace)
            );
            return Ok(false);
        }
        sleep(self.config.window_settle_delay).await;

        let point = self.config.focus_point(ChartWindow::Workspace);
        self.driver.click(point.x, point.y).await?;
        sleep(self.config.focus_click_delay).await;

        let query = format!("{}.bz", symbol.to_lowercase());
        debug!("workspace: typing symbol query {query}");
        self.driver.type_text(&query).await?;

        sleep(DROPDOWN_POPULATE_DELAY).await;
        self.driver.press(Key::Down).await?;
        sleep(DROPDOWN_SELECT_DELAY).await;
        self.driver.press(Key::Enter).await?;

        sleep(self.config.symbolik_wait_delay).await;

        let mut frame = self.driver.capture_frame().await?;
        if frame.is_blank() {
            warn!("workspace: blank frame detected, refreshing");
            self.driver.press(Key::F5).await?;
            sleep(self.config.symbolik_refresh_wait).await;
            frame = self.driver.capture_frame().await?;
            if frame.is_blank() {
                warn!("workspace: still blank after refresh, saving anyway");
            }
        }

        frame.save_png(path)?;
        Ok(true)
    }
}
