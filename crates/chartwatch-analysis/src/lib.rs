//! Multi-provider chart analysis engine for chartwatch
//!
//! Takes a set of captured screenshots, fans them out to every enabled LLM
//! provider in parallel, parses the free-text replies into trend
//! assessments, consolidates them into a single trading decision, computes
//! a consensus, and renders the text/HTML reports.

pub mod assessment;
pub mod consensus;
pub mod consolidate;
pub mod engine;
pub mod error;
pub mod report;
pub mod settings;

pub use assessment::{AlertLevel, TrendAssessment, parse_reply};
pub use consensus::{Consensus, ProviderAlert, Vote, local_consolidated_decision, parse_email_decision};
pub use consolidate::Consolidator;
pub use engine::{AnalysisEngine, ProviderOutcome};
pub use error::{AnalysisError, Result};
pub use report::{combined_text, load_prior_analysis, write_html_report, write_text_report};
pub use settings::{ProviderSettings, ProviderSlot};
