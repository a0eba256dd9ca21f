//! Real desktop backend (feature `desktop`)
//!
//! Input synthesis goes through enigo and screen capture through xcap.
//! Window focus is a best-effort portable approximation: the window list is
//! searched by title keyword and the match is raised with a click inside
//! its bounds. All OS calls run on the blocking pool.

use crate::driver::{Key, ScreenDriver};
use crate::error::{CaptureError, Result};
use crate::frame::Frame;
use async_trait::async_trait;
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use std::time::Duration;

/// Per-character delay while typing a symbol; charting search boxes drop
/// keystrokes when fed faster than a human types.
const TYPE_INTERVAL: Duration = Duration::from_millis(100);

/// Driver backed by the real desktop
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopDriver;

impl DesktopDriver {
    /// Create a desktop driver
    pub fn new() -> Self {
        Self
    }
}

fn driver_err(e: impl std::fmt::Display) -> CaptureError {
    CaptureError::Driver(e.to_string())
}

async fn run_blocking<T, F>(op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| CaptureError::Driver(format!("blocking task failed: {e}")))?
}

fn new_enigo() -> Result<Enigo> {
    Enigo::new(&Settings::default()).map_err(driver_err)
}

#[async_trait]
impl ScreenDriver for DesktopDriver {
    async fn focus_window(&self, title_keyword: &str) -> Result<bool> {
        let keyword = title_keyword.to_lowercase();
        run_blocking(move || {
            let windows = xcap::Window::all().map_err(driver_err)?;

            for window in windows {
                let Ok(title) = window.title() else { continue };
                if !title.to_lowercase().contains(&keyword) {
                    continue;
                }
                let (Ok(x), Ok(y), Ok(w), Ok(h)) =
                    (window.x(), window.y(), window.width(), window.height())
                else {
                    continue;
                };

                // Raise the window with a click inside its bounds
                let mut enigo = new_enigo()?;
                enigo
                    .move_mouse(x + (w as i32) / 2, y + (h as i32) / 2, Coordinate::Abs)
                    .map_err(driver_err)?;
                enigo
                    .button(Button::Left, Direction::Click)
                    .map_err(driver_err)?;
                std::thread::sleep(Duration::from_millis(500));
                return Ok(true);
            }

            Ok(false)
        })
        .await
    }

    async fn click(&self, x: i32, y: i32) -> Result<()> {
        run_blocking(move || {
            let mut enigo = new_enigo()?;
            enigo.move_mouse(x, y, Coordinate::Abs).map_err(driver_err)?;
            enigo
                .button(Button::Left, Direction::Click)
                .map_err(driver_err)
        })
        .await
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        run_blocking(move || {
            let mut enigo = new_enigo()?;
            for ch in text.chars() {
                enigo.text(&ch.to_string()).map_err(driver_err)?;
                std::thread::sleep(TYPE_INTERVAL);
            }
            Ok(())
        })
        .await
    }

    async fn press(&self, key: Key) -> Result<()> {
        let mapped = match key {
            Key::Enter => enigo::Key::Return,
            Key::Down => enigo::Key::DownArrow,
            Key::F5 => enigo::Key::F5,
        };
        run_blocking(move || {
            let mut enigo = new_enigo()?;
            enigo.key(mapped, Direction::Click).map_err(driver_err)
        })
        .await
    }

    async fn capture_frame(&self) -> Result<Frame> {
        run_blocking(|| {
            let monitors = xcap::Monitor::all().map_err(driver_err)?;
            let monitor = monitors
                .into_iter()
                .next()
                .ok_or_else(|| CaptureError::Driver("no monitor available".to_string()))?;

            let capture = monitor.capture_image().map_err(driver_err)?;
            let (width, height) = (capture.width(), capture.height());
            Frame::from_rgba(width, height, capture.into_raw())
        })
        .await
    }
}
