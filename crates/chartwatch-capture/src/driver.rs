//! Screen driver trait
//!
//! Everything the capture session needs from the operating system sits
//! behind this trait: window focus, pointer clicks, keystrokes, and screen
//! capture. The real backend lives in [`crate::desktop`]; tests use a mock.

use crate::error::Result;
use crate::frame::Frame;
use async_trait::async_trait;

/// Non-character keys the capture session presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Submit a symbol query
    Enter,
    /// Select the first dropdown entry
    Down,
    /// Refresh the browser page
    F5,
}

/// Trait for OS-level screen automation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScreenDriver: Send + Sync {
    /// Find a visible window whose title contains the keyword
    /// (case-insensitive), maximize it, and bring it to the foreground.
    ///
    /// Returns `Ok(false)` when no window matched.
    async fn focus_window(&self, title_keyword: &str) -> Result<bool>;

    /// Click at an absolute screen position
    async fn click(&self, x: i32, y: i32) -> Result<()>;

    /// Type text into the focused window
    async fn type_text(&self, text: &str) -> Result<()>;

    /// Press a single key
    async fn press(&self, key: Key) -> Result<()>;

    /// Capture the primary screen
    async fn capture_frame(&self) -> Result<Frame>;
}
