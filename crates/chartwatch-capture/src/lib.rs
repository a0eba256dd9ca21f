//! Screen-automation driver and capture session for chartwatch
//!
//! This crate drives the desktop charting windows: it focuses each
//! configured window, types the stock symbol, waits for the chart to load,
//! and saves a screenshot per window. The OS-level work sits behind the
//! [`ScreenDriver`] trait; the real backend (enigo + xcap) is gated behind
//! the `desktop` feature so the rest of the workspace builds and tests
//! without a display server.

pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod session;
pub mod window;

#[cfg(feature = "desktop")]
pub mod desktop;

pub use config::CaptureConfig;
pub use driver::{Key, ScreenDriver};
pub use error::{CaptureError, Result};
pub use frame::Frame;
pub use session::{CaptureSession, ScreenshotSet};
pub use window::ChartWindow;

#[cfg(feature = "desktop")]
pub use desktop::DesktopDriver;
