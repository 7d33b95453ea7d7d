use briefing_pipeline::{run_email_delivery, ArtifactStore};
use notification_service::{EmailConfig, SmtpMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    market_core::init_tracing("info");

    let store = ArtifactStore::from_env();
    let config = EmailConfig::from_env()?;
    let mailer = SmtpMailer::new(&config)?;
    let today = chrono::Local::now().date_naive();

    let report = run_email_delivery(&mailer, &config, &store, today).await?;
    tracing::info!(
        "Delivery finished: {} sent, {} failed",
        report.sent_count,
        report.failed_count
    );

    if !report.success {
        tracing::error!("Failed recipients: {}", report.failed_emails.join(", "));
        anyhow::bail!(
            "{} of {} emails failed",
            report.failed_count,
            report.sent_count + report.failed_count
        );
    }
    Ok(())
}
