mod message;
mod smtp;

pub use message::{briefing_subject, build_html_message};
pub use smtp::{SmtpMailer, SmtpTls, SMTP_POOL_SIZE};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::message::Mailbox;
use lettre::Message;
use serde::{Deserialize, Serialize};

/// Trait for anything that can deliver a built message.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), NotificationError>;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid address: {0}")]
    Address(String),
}

/// SMTP settings loaded from `EMAIL_*` variables.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

impl EmailConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self, NotificationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NotificationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let host = get("EMAIL_HOST");
        let user = get("EMAIL_USER");
        let password = get("EMAIL_PASSWORD");
        let from = get("EMAIL_FROM");
        let to: Vec<String> = lookup("EMAIL_TO")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut missing = Vec::new();
        for (key, present) in [
            ("EMAIL_HOST", host.is_some()),
            ("EMAIL_USER", user.is_some()),
            ("EMAIL_PASSWORD", password.is_some()),
            ("EMAIL_FROM", from.is_some()),
            ("EMAIL_TO", !to.is_empty()),
        ] {
            if !present {
                missing.push(key);
            }
        }

        if !missing.is_empty() {
            return Err(NotificationError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let port = match get("EMAIL_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| NotificationError::Config(format!("Invalid EMAIL_PORT: {}", raw)))?,
            None => 587,
        };

        let config = Self {
            host: host.unwrap_or_default(),
            port,
            user: user.unwrap_or_default(),
            password: password.unwrap_or_default(),
            from: from.unwrap_or_default(),
            to,
        };

        tracing::info!(
            "Email config loaded: {}:{} from {} to {} recipients",
            config.host,
            config.port,
            config.from,
            config.to.len()
        );

        Ok(config)
    }
}

/// Outcome of a multi-recipient send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub success: bool,
    pub sent_count: usize,
    pub failed_count: usize,
    pub failed_emails: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Send `html` to every configured recipient, one at a time over `transport`.
///
/// A failed recipient is counted and skipped; earlier sends are not undone.
pub async fn send_briefing_email<T: EmailTransport + ?Sized>(
    transport: &T,
    config: &EmailConfig,
    subject: &str,
    html: &str,
) -> DeliveryReport {
    tracing::info!("Sending briefing email to {} recipients", config.to.len());

    let from: Mailbox = match config.from.parse() {
        Ok(from) => from,
        Err(e) => {
            tracing::error!("Invalid from address {}: {}", config.from, e);
            return DeliveryReport {
                success: false,
                sent_count: 0,
                failed_count: config.to.len(),
                failed_emails: config.to.clone(),
                error: Some(format!("Invalid from address {}: {}", config.from, e)),
                timestamp: Utc::now(),
            };
        }
    };

    let mut sent_count = 0;
    let mut failed_emails = Vec::new();

    for recipient in &config.to {
        let outcome = match build_html_message(&from, recipient, subject, html) {
            Ok(message) => transport.send(message).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                sent_count += 1;
                tracing::info!("Sent briefing to {}", recipient);
            }
            Err(e) => {
                failed_emails.push(recipient.clone());
                tracing::error!("Failed to send briefing to {}: {}", recipient, e);
            }
        }
    }

    let failed_count = failed_emails.len();
    tracing::info!("Email delivery finished: {} sent, {} failed", sent_count, failed_count);

    DeliveryReport {
        success: failed_count == 0,
        sent_count,
        failed_count,
        failed_emails,
        error: None,
        timestamp: Utc::now(),
    }
}
