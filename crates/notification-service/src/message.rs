use chrono::NaiveDate;
use lettre::message::{header::ContentType, Mailbox};
use lettre::Message;

use crate::NotificationError;

/// Subject line for the daily briefing mail.
pub fn briefing_subject(date: NaiveDate) -> String {
    format!(
        "Good Morning Wall Street - {} Daily Briefing",
        date.format("%Y-%m-%d")
    )
}

/// Build a single-recipient `text/html; charset=utf-8` message.
pub fn build_html_message(
    from: &Mailbox,
    to: &str,
    subject: &str,
    html: &str,
) -> Result<Message, NotificationError> {
    let to: Mailbox = to
        .parse()
        .map_err(|e| NotificationError::Address(format!("{}: {}", to, e)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())
        .map_err(|e| NotificationError::Smtp(format!("Failed to build email: {}", e)))
}
