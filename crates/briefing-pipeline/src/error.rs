use market_core::MarketError;
use notification_service::NotificationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No {0} artifact found")]
    NoArtifact(String),

    #[error("Unusable screening artifact: {0}")]
    InvalidScreening(String),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
