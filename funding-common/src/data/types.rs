// =================================================================
// data/types.rs - Shared Funding Rate Data Structures
// =================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported perpetual futures venues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Binance,
    Bybit,
    Okx,
}

impl Venue {
    pub fn all() -> [Venue; 3] {
        [Venue::Binance, Venue::Bybit, Venue::Okx]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Binance => "binance",
            Venue::Bybit => "bybit",
            Venue::Okx => "okx",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Unknown venue: {0}")]
pub struct VenueParseError(pub String);

impl FromStr for Venue {
    type Err = VenueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binance" => Ok(Venue::Binance),
            "bybit" => Ok(Venue::Bybit),
            "okx" => Ok(Venue::Okx),
            other => Err(VenueParseError(other.to_string())),
        }
    }
}

/// A single historical funding rate observation.
///
/// `rate` is a signed fraction per funding interval (0.0001 = 1bp).
/// Sequences handed to the backtester must be sorted ascending by
/// `timestamp`; duplicate timestamps are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingObservation {
    pub timestamp: DateTime<Utc>,
    pub rate: Decimal,
}

impl FundingObservation {
    pub fn new(timestamp: DateTime<Utc>, rate: Decimal) -> Self {
        Self { timestamp, rate }
    }
}

/// The live funding rate on one venue at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub venue: Venue,
    pub symbol: String,
    pub rate: Decimal,
    pub timestamp: DateTime<Utc>,
}
