use async_trait::async_trait;
use lettre::{
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{EmailConfig, EmailTransport, NotificationError};

/// How the connection to the relay is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

impl SmtpTls {
    /// 587 upgrades with STARTTLS, 465 is implicit TLS, anything else is plain.
    pub fn for_port(port: u16) -> Self {
        match port {
            587 => SmtpTls::StartTls,
            465 => SmtpTls::Tls,
            _ => SmtpTls::None,
        }
    }
}

/// Connections kept open by the mailer. Recipients are sent one after
/// another, so a single connection serves the whole run.
pub const SMTP_POOL_SIZE: u32 = 1;

/// SMTP transport whose pool holds one connection reused for every
/// recipient of a run. Building it needs a running tokio runtime.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, NotificationError> {
        let host = config.host.as_str();

        let mut builder = match SmtpTls::for_port(config.port) {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
            SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
        }
        .map_err(|e| NotificationError::Smtp(format!("SMTP transport error: {}", e)))?;

        builder = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .pool_config(PoolConfig::new().min_idle(0).max_size(SMTP_POOL_SIZE));

        tracing::info!("SMTP transport ready for {}:{}", config.host, config.port);

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), NotificationError> {
        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Smtp(format!("Failed to send email: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_mode_by_port() {
        assert_eq!(SmtpTls::for_port(587), SmtpTls::StartTls);
        assert_eq!(SmtpTls::for_port(465), SmtpTls::Tls);
        assert_eq!(SmtpTls::for_port(25), SmtpTls::None);
    }

    // The pooled transport spawns its idle-connection task on build.
    #[tokio::test]
    async fn test_pooled_mailer_builds_inside_runtime_without_connecting() {
        let config = EmailConfig {
            host: "localhost".into(),
            port: 2525,
            user: "u".into(),
            password: "p".into(),
            from: "f@example.com".into(),
            to: vec!["t@example.com".into()],
        };
        assert!(SmtpMailer::new(&config).is_ok());
    }
}
