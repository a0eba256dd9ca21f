//! Prompt templates for chartwatch
//!
//! Two prompt families live here: the per-provider chart-analysis prompt
//! (base instructions + per-window chart context + trend-evaluation
//! contract) and the consolidation prompt that merges all provider
//! analyses into one decision. Both are MiniJinja templates rendered per
//! call.

pub mod analysis;
pub mod consolidation;
pub mod contexts;
pub mod error;

pub use analysis::{ANALYSIS_MARKER, TREND_EVALUATION_MARKER, analysis_prompt};
pub use consolidation::{ProviderAnalysis, consolidation_prompt};
pub use contexts::chart_context;
pub use error::{PromptError, Result};
