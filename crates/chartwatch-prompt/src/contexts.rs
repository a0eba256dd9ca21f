//! Chart-specific context snippets
//!
//! Each captured window carries a context block describing the indicators
//! on that layout, so the model knows what it is looking at.

use chartwatch_capture::ChartWindow;

/// Context block for a chart window
pub fn chart_context(window: ChartWindow) -> &'static str {
    match window {
        ChartWindow::TrendAnalysis => TREND_ANALYSIS,
        ChartWindow::HeikenAshi => HEIKEN_ASHI,
        ChartWindow::VolumeLayout => VOLUME_LAYOUT,
        ChartWindow::VolumeProfile => VOLUME_PROFILE,
        ChartWindow::Workspace => WORKSPACE,
    }
}

/// Combined context for a set of windows, in capture order
pub fn combined_context(windows: &[ChartWindow]) -> String {
    let mut context = String::new();
    for window in windows {
        context.push_str(chart_context(*window));
        context.push('\n');
    }
    context
}

const TREND_ANALYSIS: &str = "\
CHART CONTEXT - Trend Analysis Window:
This chart displays LuxAlgo technical indicators. Use the following documentation to analyze it:
- LuxAlgo Signals & Overlays: https://docs.luxalgo.com/docs/algos/signals-overlays/signals
- LuxAlgo Price Action Concepts: https://docs.luxalgo.com/docs/algos/price-action-concepts/introduction

Pay special attention to:
- Signal Quality (Strong Buy/Sell signals)
- Price Action Concepts (Support/Resistance levels, market structure)
- Overlay indicators (trend direction, strength)
- Signal confirmations and divergences
";

const HEIKEN_ASHI: &str = "\
CHART CONTEXT - Smoothed Heiken Ashi Candles Window:
This chart displays the following technical indicators:
- Smoothed Heiken Ashi Candles: Trend-following candles that smooth out price action
- AlgoAlpha HEMA Trend: Hybrid Exponential Moving Average for trend identification
- Divergence Indicators: Price vs indicator divergences for reversal signals
- Volume Footprint: Order flow analysis showing buy/sell volume at each price level

Pay special attention to:
- Smoothed Heiken Ashi candle colors (bullish/bearish trends)
- HEMA trend direction and crossovers
- Divergence signals (bullish/bearish divergences)
- Trend strength and momentum
- Reversal patterns indicated by divergences
- Volume Footprint Analysis:
  * Absorption: Large volume at price level with minimal price movement indicates strong institutional support/resistance
  * Exhaustion: Decreasing volume as price extends signals trend weakness and potential reversal
  * Bid/ask imbalances at key levels for order flow confirmation
";

const VOLUME_LAYOUT: &str = "\
CHART CONTEXT - Volume Layout Window:
This chart displays the following technical indicators:
- LuxAlgo Money Flow Profile: Shows institutional money flow and buying/selling pressure
- CVD Divergence Oscillator: Cumulative Volume Delta divergences for trend reversals
- SQZMOM_LB: Squeeze Momentum indicator with LazyBear modifications
- MA Distance with StdDev Bands: Moving average distance with standard deviation bands

Pay special attention to:
- Money flow profile (accumulation/distribution zones)
- CVD divergence signals (bullish/bearish divergences)
- SQZMOM_LB squeeze conditions and momentum direction
- MA distance from price and standard deviation extremes
- **CRITICAL**: If a +RD (Positive Reversal Divergence) or -RD (Negative Reversal Divergence) was formed recently, clearly indicate this in the analysis as it signals potential trend reversal
- Volume patterns confirming or diverging from price action
";

const VOLUME_PROFILE: &str = "\
CHART CONTEXT - Volume Profile Window:
This chart displays the following technical indicators:
- RVOL (Relative Volume): Volume relative to average
- VOLD Ratio: Volume delta ratio
- MS (Matrix Mod): Overbought/oversold conditions
- TTOB Order Blocks: Trapped trader order blocks

Pay special attention to:
- RVOL levels (high RVOL confirms price moves)
- VOLD ratio for buying/selling pressure
- MS overbought/oversold conditions
- Order block support/resistance zones
";

const WORKSPACE: &str = "\
CHART CONTEXT - Symbolik Workspace Window:
This chart displays the following technical indicators:
- ATM Chart Lines: Algorithmic Trading Model support/resistance lines
- ATM Elliott Projections: Elliott Wave price projections and targets
- ATM Elliott Waves: Elliott Wave count and structure analysis
- ATM Pressure Alert: Market pressure and momentum alerts
- TKT Analysis: Technical Knowledge Trading analysis framework
- TKT Score: Quantified trading opportunity score
- Variable Aggressive Sequential (Demark Sequential): TD Sequential buy/sell setup and countdown signals

Pay special attention to:
- **ATM Chart Lines alignment**: If the current price is sitting on or near an ATM chart line, clearly indicate this in the analysis as it represents a key support/resistance level
- ATM Elliott Wave count and current position in the wave structure
- ATM Elliott projections for price targets
- ATM Pressure alerts (bullish/bearish pressure signals)
- TKT analysis signals and overall market structure
- TKT score value (higher scores indicate stronger opportunities)
- Variable Aggressive Sequential setup and countdown numbers (9s and 13s are critical)
- Demark Sequential buy/sell signals at exhaustion points
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_window_has_context() {
        for window in ChartWindow::ALL {
            assert!(chart_context(window).starts_with("CHART CONTEXT"));
        }
    }

    #[test]
    fn test_combined_context_order() {
        let combined = combined_context(&[ChartWindow::TrendAnalysis, ChartWindow::Workspace]);
        let trend_pos = combined.find("Trend Analysis Window").unwrap();
        let workspace_pos = combined.find("Symbolik Workspace Window").unwrap();
        assert!(trend_pos < workspace_pos);
    }

    #[test]
    fn test_reversal_divergence_callout_present() {
        assert!(chart_context(ChartWindow::VolumeLayout).contains("+RD"));
    }
}
