//! Email alerting for chartwatch
//!
//! Sends one plain-text alert per run when the consensus flags changes.
//! Alerts are only sent from the consensus step, never from individual
//! providers. SMTP goes through lettre with STARTTLS; the blocking send
//! runs on the tokio blocking pool.

use chartwatch_analysis::Consensus;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::{info, warn};

/// Result type alias for alert operations
pub type Result<T> = std::result::Result<T, AlertError>;

/// Errors that can occur while sending an alert
#[derive(Debug, Error)]
pub enum AlertError {
    /// Sender or recipient address did not parse
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Message could not be built
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    /// SMTP transport failed
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The blocking send task was cancelled
    #[error("send task failed: {0}")]
    Join(String),
}

/// Email settings, loaded from environment variables
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname (default: smtp.gmail.com)
    pub smtp_server: String,
    /// SMTP port (default: 587, STARTTLS)
    pub smtp_port: u16,
    /// Sender account
    pub email_user: Option<String>,
    /// Sender password or app token
    pub email_password: Option<String>,
    /// Recipient address
    pub email_to: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            email_user: None,
            email_password: None,
            email_to: None,
        }
    }
}

impl EmailConfig {
    /// Load settings from `SMTP_SERVER`, `SMTP_PORT`, `EMAIL_USER`,
    /// `EMAIL_PASSWORD`, and `EMAIL_TO`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            smtp_server: std::env::var("SMTP_SERVER").unwrap_or(defaults.smtp_server),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.smtp_port),
            email_user: std::env::var("EMAIL_USER").ok().filter(|v| !v.is_empty()),
            email_password: std::env::var("EMAIL_PASSWORD").ok().filter(|v| !v.is_empty()),
            email_to: std::env::var("EMAIL_TO").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Whether user, password, and recipient are all present
    pub fn is_configured(&self) -> bool {
        self.email_user.is_some() && self.email_password.is_some() && self.email_to.is_some()
    }
}

/// Sends trend alerts over SMTP
pub struct AlertMailer {
    config: EmailConfig,
}

impl AlertMailer {
    /// Create a mailer over the given configuration
    pub fn new(config: EmailConfig) -> Self {
        if !config.is_configured() {
            warn!("email alerts not configured, set EMAIL_USER, EMAIL_PASSWORD, and EMAIL_TO");
        }
        Self { config }
    }

    /// Create a mailer from environment variables
    pub fn from_env() -> Self {
        Self::new(EmailConfig::from_env())
    }

    /// Get the mailer configuration
    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// Send an alert for the consensus, with the full report appended
    ///
    /// Returns `Ok(false)` when not configured, `Ok(true)` when the alert
    /// was sent or the consensus needed none.
    pub async fn send_trend_alert(
        &self,
        consensus: &Consensus,
        report: &str,
        symbol: Option<&str>,
    ) -> Result<bool> {
        let (Some(user), Some(password), Some(to)) = (
            self.config.email_user.clone(),
            self.config.email_password.clone(),
            self.config.email_to.clone(),
        ) else {
            warn!("email not configured, skipping alert");
            return Ok(false);
        };

        if !consensus.has_changes {
            info!("no significant changes, no email needed");
            return Ok(true);
        }

        let subject = email_subject(consensus, symbol);
        let body = email_body(consensus, report, symbol);

        let email = Message::builder()
            .from(user.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .body(body)?;

        let server = self.config.smtp_server.clone();
        let port = self.config.smtp_port;

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mailer = SmtpTransport::starttls_relay(&server)?
                .port(port)
                .credentials(Credentials::new(user, password))
                .build();
            mailer.send(&email)?;
            Ok(())
        })
        .await
        .map_err(|e| AlertError::Join(e.to_string()))??;

        info!("email alert sent to {}", self.config.email_to.as_deref().unwrap_or(""));
        Ok(true)
    }
}

/// Build the subject line for an alert
fn email_subject(consensus: &Consensus, symbol: Option<&str>) -> String {
    use chartwatch_analysis::AlertLevel;

    let symbol_text = symbol.map(|s| format!(" - {s}")).unwrap_or_default();
    match consensus.alert_level {
        AlertLevel::Critical => format!("[CRITICAL] STOCK ALERT{symbol_text} - Major Trend Changes"),
        AlertLevel::High => format!("[WARN] HIGH STOCK ALERT{symbol_text} - Significant Changes"),
        AlertLevel::Medium => format!("[DATA] MEDIUM STOCK ALERT{symbol_text} - Notable Changes"),
        _ => format!("[INFO] Stock Update{symbol_text} - Changes Detected"),
    }
}

/// Build the plain-text body for an alert
fn email_body(consensus: &Consensus, report: &str, symbol: Option<&str>) -> String {
    let symbol_text = symbol.map(|s| format!(" for {s}")).unwrap_or_default();
    let rule = "=".repeat(60);

    let mut body = format!(
        "\nStock Analysis Alert{symbol_text}\nGenerated: {}\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    body.push_str(&format!(
        "ALERT LEVEL: {}\n\n",
        consensus.alert_level.as_str().to_uppercase()
    ));
    body.push_str(&format!(
        "TREND CHANGE PROBABILITY: {:.1}% (Confidence: {})\n\n",
        consensus.trend_change_probability,
        consensus.confidence_level.to_uppercase()
    ));
    body.push_str(&format!("SUMMARY:\n{}\n\n", consensus.summary));

    body.push_str("PROVIDER ALERTS:\n");
    if consensus.alerts.is_empty() {
        body.push_str("- No individual provider alerts\n");
    } else {
        for alert in &consensus.alerts {
            body.push_str(&format!(
                "- {}: {} ({:.0}%) - {}\n",
                alert.provider,
                alert.alert_level.as_str().to_uppercase(),
                alert.probability,
                alert.summary
            ));
        }
    }

    body.push_str(&format!("\n{rule}\nCOMPLETE ANALYSIS REPORT\n{rule}\n\n"));
    body.push_str(report);
    body.push_str("\n\n---\nThis alert was generated automatically by chartwatch.");
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartwatch_analysis::{AlertLevel, ProviderAlert};

    fn consensus(level: AlertLevel, has_changes: bool) -> Consensus {
        Consensus {
            has_changes,
            alert_level: level,
            summary: "Breakout confirmed by consensus".to_string(),
            trend_change_probability: 72.5,
            probability_range: (60.0, 85.0),
            confidence_level: "high".to_string(),
            provider_count: 3,
            provider_agreement: 66.7,
            consolidator_decision: true,
            alerts: vec![ProviderAlert {
                provider: "claude".to_string(),
                alert_level: level,
                summary: "Breakout".to_string(),
                probability: 85.0,
            }],
        }
    }

    #[test]
    fn test_subject_by_level() {
        let symbol = Some("QBTS");
        assert_eq!(
            email_subject(&consensus(AlertLevel::Critical, true), symbol),
            "[CRITICAL] STOCK ALERT - QBTS - Major Trend Changes"
        );
        assert_eq!(
            email_subject(&consensus(AlertLevel::High, true), symbol),
            "[WARN] HIGH STOCK ALERT - QBTS - Significant Changes"
        );
        assert_eq!(
            email_subject(&consensus(AlertLevel::Medium, true), symbol),
            "[DATA] MEDIUM STOCK ALERT - QBTS - Notable Changes"
        );
        assert_eq!(
            email_subject(&consensus(AlertLevel::Low, true), None),
            "[INFO] Stock Update - Changes Detected"
        );
    }

    #[test]
    fn test_body_contents() {
        let body = email_body(
            &consensus(AlertLevel::High, true),
            "FULL REPORT TEXT",
            Some("QBTS"),
        );

        assert!(body.contains("Stock Analysis Alert for QBTS"));
        assert!(body.contains("ALERT LEVEL: HIGH"));
        assert!(body.contains("TREND CHANGE PROBABILITY: 72.5% (Confidence: HIGH)"));
        assert!(body.contains("Breakout confirmed by consensus"));
        assert!(body.contains("- claude: HIGH (85%) - Breakout"));
        assert!(body.contains("COMPLETE ANALYSIS REPORT"));
        assert!(body.contains("FULL REPORT TEXT"));
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_skips() {
        let mailer = AlertMailer::new(EmailConfig::default());
        let sent = mailer
            .send_trend_alert(&consensus(AlertLevel::High, true), "report", Some("QBTS"))
            .await
            .unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_no_changes_needs_no_email() {
        let config = EmailConfig {
            email_user: Some("user@example.com".to_string()),
            email_password: Some("secret".to_string()),
            email_to: Some("trader@example.com".to_string()),
            ..EmailConfig::default()
        };
        let mailer = AlertMailer::new(config);
        let sent = mailer
            .send_trend_alert(&consensus(AlertLevel::Low, false), "report", None)
            .await
            .unwrap();
        assert!(sent);
    }

    #[test]
    fn test_config_is_configured() {
        assert!(!EmailConfig::default().is_configured());
        let config = EmailConfig {
            email_user: Some("u".to_string()),
            email_password: Some("p".to_string()),
            email_to: Some("t".to_string()),
            ..EmailConfig::default()
        };
        assert!(config.is_configured());
    }
}
