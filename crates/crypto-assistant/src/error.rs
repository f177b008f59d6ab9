//! Error Types for the Crypto Assistant

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Market data provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Market data unavailable: {0}")]
    Unavailable(String),

    #[error("Price unavailable for {0}")]
    PriceUnavailable(String),

    #[error("Unknown coin: {0}")]
    UnknownCoin(String),

    #[error("Malformed market data: {0}")]
    Malformed(String),

    #[error("Invalid date '{0}', expected DD-MM-YYYY")]
    InvalidDate(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
