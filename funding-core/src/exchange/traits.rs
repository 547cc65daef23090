// exchange/traits.rs

use super::errors::ExchangeError;
use async_trait::async_trait;
use funding_common::{FundingObservation, RateSnapshot, Venue};

/// Funding data interface all venue implementations must follow
#[async_trait]
pub trait FundingRateSource: Send + Sync {
    fn venue(&self) -> Venue;

    /// Historical funding rates for a perpetual symbol, sorted ascending by
    /// funding time. An empty history surfaces as `ExchangeError::NoData`.
    async fn funding_rate_history(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<FundingObservation>, ExchangeError>;

    /// The most recent funding rate for a perpetual symbol
    async fn current_funding_rate(&self, symbol: &str)
        -> Result<RateSnapshot, ExchangeError>;
}
