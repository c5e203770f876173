//! Error types for the market data handler

use thiserror::Error;

/// Market data handler errors
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("FIX session error: {0}")]
    Session(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("signing key error: {0}")]
    Signer(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("session did not come up within {0} seconds")]
    StartTimeout(u64),
}

impl From<quickfix::QuickFixError> for MarketDataError {
    fn from(err: quickfix::QuickFixError) -> Self {
        MarketDataError::Session(err.to_string())
    }
}

impl From<std::io::Error> for MarketDataError {
    fn from(err: std::io::Error) -> Self {
        MarketDataError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarketDataError>;
