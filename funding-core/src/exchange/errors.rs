// =================================================================
// exchange/errors.rs - Error Types
// =================================================================

use funding_common::Venue;
use thiserror::Error;

/// Error types for funding data retrieval
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Data parsing error: {0}")]
    Parse(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The venue answered but has no funding data for this symbol.
    /// Callers get this instead of partial or empty observation sequences.
    #[error("No funding data for {symbol} on {venue}")]
    NoData { venue: Venue, symbol: String },

    #[error("Exchange API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        ExchangeError::Network(err.to_string())
    }
}
