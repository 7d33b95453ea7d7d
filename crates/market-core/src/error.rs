use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Invalid screener type: {0}. Available types: most_actives, day_gainers, day_losers")]
    InvalidScreenType(String),

    #[error("Invalid ticker: {0}. Tickers are 1-10 uppercase letters")]
    InvalidTicker(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type MarketResult<T> = Result<T, MarketError>;
