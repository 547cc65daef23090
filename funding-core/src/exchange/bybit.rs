// =================================================================
// exchange/bybit.rs - Bybit Perpetual Funding Data
// =================================================================

use async_trait::async_trait;
use funding_common::{FundingObservation, RateSnapshot, Venue};
use tracing::debug;

use super::{
    errors::ExchangeError,
    traits::FundingRateSource,
    types::{BybitFundingHistoryResult, BybitResponse, BybitTickersResult},
    utils::{parse_millis, parse_millis_str, parse_rate, validate_symbol},
};

// Constants
const BYBIT_API_URL: &str = "https://api.bybit.com";

/// Bybit linear perpetual funding data source (v5 API)
pub struct BybitPerpetual {
    api_url: String,
    client: reqwest::Client,
}

impl BybitPerpetual {
    pub fn new() -> Self {
        Self {
            api_url: BYBIT_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn parse_funding_history(
        &self,
        body: &str,
        symbol: &str,
    ) -> Result<Vec<FundingObservation>, ExchangeError> {
        let response: BybitResponse<BybitFundingHistoryResult> = serde_json::from_str(body)
            .map_err(|e| ExchangeError::Parse(format!("Funding history: {}", e)))?;
        if response.ret_code != 0 {
            return Err(ExchangeError::Api(response.ret_msg));
        }
        if response.result.list.is_empty() {
            return Err(ExchangeError::NoData {
                venue: self.venue(),
                symbol: symbol.to_string(),
            });
        }

        let mut observations = response
            .result
            .list
            .iter()
            .map(|entry| {
                Ok(FundingObservation::new(
                    parse_millis_str(&entry.funding_rate_timestamp)?,
                    parse_rate(&entry.funding_rate)?,
                ))
            })
            .collect::<Result<Vec<_>, ExchangeError>>()?;

        observations.sort_by_key(|observation| observation.timestamp);
        Ok(observations)
    }

    fn parse_tickers(&self, body: &str, symbol: &str) -> Result<RateSnapshot, ExchangeError> {
        let response: BybitResponse<BybitTickersResult> = serde_json::from_str(body)
            .map_err(|e| ExchangeError::Parse(format!("Tickers: {}", e)))?;
        if response.ret_code != 0 {
            return Err(ExchangeError::Api(response.ret_msg));
        }

        let ticker = response.result.list.first().ok_or(ExchangeError::NoData {
            venue: self.venue(),
            symbol: symbol.to_string(),
        })?;

        Ok(RateSnapshot {
            venue: self.venue(),
            symbol: symbol.to_string(),
            rate: parse_rate(&ticker.funding_rate)?,
            timestamp: parse_millis(response.time)?,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ExchangeError> {
        let url = format!("{}{}", self.api_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        if !response.status().is_success() {
            return Err(ExchangeError::Api(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl FundingRateSource for BybitPerpetual {
    fn venue(&self) -> Venue {
        Venue::Bybit
    }

    async fn funding_rate_history(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<FundingObservation>, ExchangeError> {
        let symbol = validate_symbol(symbol)?;
        let limit = limit.to_string();
        debug!("Fetching Bybit funding history for {}", symbol);

        let body = self
            .get(
                "/v5/market/funding/history",
                &[
                    ("category", "linear"),
                    ("symbol", symbol.as_str()),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        self.parse_funding_history(&body, &symbol)
    }

    async fn current_funding_rate(
        &self,
        symbol: &str,
    ) -> Result<RateSnapshot, ExchangeError> {
        let symbol = validate_symbol(symbol)?;
        let body = self
            .get(
                "/v5/market/tickers",
                &[("category", "linear"), ("symbol", symbol.as_str())],
            )
            .await?;
        self.parse_tickers(&body, &symbol)
    }
}

impl Default for BybitPerpetual {
    fn default() -> Self {
        Self::new()
    }
}
