//! Chart window identities
//!
//! The pipeline captures four TradingView layouts plus the browser-based
//! Symbolik workspace. Each window has a stable key used as the map key in
//! screenshot sets, prompts, and reports.

use serde::{Deserialize, Serialize};

/// A chart window the capture session knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartWindow {
    /// TradingView tab 1: LuxAlgo trend analysis layout
    TrendAnalysis,
    /// TradingView tab 2: Smoothed Heiken Ashi candles layout
    HeikenAshi,
    /// TradingView tab 3: volume layout (money flow, CVD, SQZMOM)
    VolumeLayout,
    /// TradingView tab 4: volume profile layout (RVOL, VOLD, order blocks)
    VolumeProfile,
    /// Symbolik browser workspace (ATM / TKT / Demark Sequential)
    Workspace,
}

impl ChartWindow {
    /// All windows in capture order
    pub const ALL: [Self; 5] = [
        Self::TrendAnalysis,
        Self::HeikenAshi,
        Self::VolumeLayout,
        Self::VolumeProfile,
        Self::Workspace,
    ];

    /// The TradingView subset, in tab order
    pub const TRADINGVIEW: [Self; 4] = [
        Self::TrendAnalysis,
        Self::HeikenAshi,
        Self::VolumeLayout,
        Self::VolumeProfile,
    ];

    /// Stable identifier used in screenshot maps and prompt contexts
    pub fn key(self) -> &'static str {
        match self {
            Self::TrendAnalysis => "trend_analysis",
            Self::HeikenAshi => "heiken_ashi",
            Self::VolumeLayout => "volume_layout",
            Self::VolumeProfile => "volumeprofile",
            Self::Workspace => "workspace",
        }
    }

    /// Human-readable label for logs and reports
    pub fn label(self) -> &'static str {
        match self {
            Self::TrendAnalysis => "Trend Analysis",
            Self::HeikenAshi => "Smoothed Heiken Ashi Candles",
            Self::VolumeLayout => "Volume Layout",
            Self::VolumeProfile => "Volume Profile",
            Self::Workspace => "Symbolik Workspace",
        }
    }

    /// Default window-title keyword used to locate the window
    pub fn default_title_keyword(self) -> &'static str {
        match self {
            Self::TrendAnalysis => "trend analysis",
            Self::HeikenAshi => "Smoothed Heiken Ashi Candles",
            Self::VolumeLayout => "volume layout",
            Self::VolumeProfile => "volumeprofile",
            Self::Workspace => "workspace",
        }
    }

    /// Default screenshot filename pattern (`{symbol}` placeholder)
    pub fn default_filename_pattern(self) -> &'static str {
        match self {
            Self::TrendAnalysis => "{symbol}_tab1.png",
            Self::HeikenAshi => "{symbol}_tab2.png",
            Self::VolumeLayout => "{symbol}_tab3.png",
            Self::VolumeProfile => "{symbol}_tab4.png",
            Self::Workspace => "{symbol}_symbolik.png",
        }
    }

    /// One-based tab number for the TradingView windows
    pub fn tab_number(self) -> Option<u8> {
        match self {
            Self::TrendAnalysis => Some(1),
            Self::HeikenAshi => Some(2),
            Self::VolumeLayout => Some(3),
            Self::VolumeProfile => Some(4),
            Self::Workspace => None,
        }
    }

    /// Look up a window by its stable key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.key() == key)
    }
}

impl std::fmt::Display for ChartWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
