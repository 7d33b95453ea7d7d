use chrono::NaiveDate;
use notification_service::{
    briefing_subject, send_briefing_email, DeliveryReport, EmailConfig, EmailTransport,
};

use crate::briefing::BRIEFING_PREFIX;
use crate::{ArtifactStore, PipelineError, PipelineResult};

/// Mail the most recent HTML briefing to every configured recipient.
pub async fn run_email_delivery<T: EmailTransport + ?Sized>(
    transport: &T,
    config: &EmailConfig,
    store: &ArtifactStore,
    today: NaiveDate,
) -> PipelineResult<DeliveryReport> {
    let path = store
        .latest(BRIEFING_PREFIX, "html")?
        .ok_or_else(|| PipelineError::NoArtifact(format!("{} html", BRIEFING_PREFIX)))?;
    tracing::info!("Loading briefing {}", path.display());

    let html = std::fs::read_to_string(&path)?;
    let subject = briefing_subject(today);

    Ok(send_briefing_email(transport, config, &subject, &html).await)
}
