// =================================================================
// exchange/binance.rs - Binance Perpetual Futures Funding Data
// =================================================================

use async_trait::async_trait;
use funding_common::{FundingObservation, RateSnapshot, Venue};
use tracing::debug;

use super::{
    errors::ExchangeError,
    traits::FundingRateSource,
    types::{BinanceFundingEntry, BinancePremiumIndex},
    utils::{parse_millis, parse_rate, validate_symbol},
};

// Constants
const BINANCE_FAPI_URL: &str = "https://fapi.binance.com";

/// Binance USD-M futures funding data source
pub struct BinanceFutures {
    api_url: String,
    client: reqwest::Client,
}

impl BinanceFutures {
    pub fn new() -> Self {
        Self {
            api_url: BINANCE_FAPI_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn parse_funding_history(
        &self,
        body: &str,
        symbol: &str,
    ) -> Result<Vec<FundingObservation>, ExchangeError> {
        let entries: Vec<BinanceFundingEntry> = serde_json::from_str(body)
            .map_err(|e| ExchangeError::Parse(format!("Funding history: {}", e)))?;

        if entries.is_empty() {
            return Err(ExchangeError::NoData {
                venue: self.venue(),
                symbol: symbol.to_string(),
            });
        }

        let mut observations = entries
            .iter()
            .map(|entry| {
                Ok(FundingObservation::new(
                    parse_millis(entry.funding_time)?,
                    parse_rate(&entry.funding_rate)?,
                ))
            })
            .collect::<Result<Vec<_>, ExchangeError>>()?;

        // The API returns newest first; the backtester needs oldest first
        observations.sort_by_key(|observation| observation.timestamp);
        Ok(observations)
    }

    fn parse_premium_index(
        &self,
        body: &str,
        symbol: &str,
    ) -> Result<RateSnapshot, ExchangeError> {
        let index: BinancePremiumIndex = serde_json::from_str(body)
            .map_err(|e| ExchangeError::Parse(format!("Premium index: {}", e)))?;

        Ok(RateSnapshot {
            venue: self.venue(),
            symbol: symbol.to_string(),
            rate: parse_rate(&index.last_funding_rate)?,
            timestamp: parse_millis(index.time)?,
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
impl FundingRateSource for BinanceFutures {
    fn venue(&self) -> Venue {
        Venue::Binance
    }

    async fn funding_rate_history(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<FundingObservation>, ExchangeError> {
        let symbol = validate_symbol(symbol)?;
        let limit = limit.to_string();
        debug!("Fetching Binance funding history for {}", symbol);

        let body = self
            .get(
                "/fapi/v1/fundingRate",
                &[("symbol", symbol.as_str()), ("limit", limit.as_str())],
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
            .get("/fapi/v1/premiumIndex", &[("symbol", symbol.as_str())])
            .await?;
        self.parse_premium_index(&body, &symbol)
    }
}

impl Default for BinanceFutures {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_funding_history_sorts_ascending() {
        let source = BinanceFutures::new();

        let body = r#"[
            {
                "symbol": "BTCUSDT",
                "fundingTime": 1672070400000,
                "fundingRate": "0.00020000"
            },
            {
                "symbol": "BTCUSDT",
                "fundingTime": 1672041600000,
                "fundingRate": "0.00010000"
            }
        ]"#;

        let observations = source.parse_funding_history(body, "BTCUSDT").unwrap();
        assert_eq!(observations.len(), 2);
        assert!(observations[0].timestamp < observations[1].timestamp);
        assert_eq!(observations[0].rate, "0.0001".parse().unwrap());
        assert_eq!(observations[1].rate, "0.0002".parse().unwrap());
    }

    #[test]
    fn test_empty_history_is_no_data() {
        let source = BinanceFutures::new();
        let result = source.parse_funding_history("[]", "NOPEUSDT");
        match result {
            Err(ExchangeError::NoData { venue, symbol }) => {
                assert_eq!(venue, Venue::Binance);
                assert_eq!(symbol, "NOPEUSDT");
            }
            other => panic!("Expected NoData, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_premium_index() {
        let source = BinanceFutures::new();

        let body = r#"{
            "symbol": "BTCUSDT",
            "markPrice": "50000.00000000",
            "lastFundingRate": "0.00010000",
            "nextFundingTime": 1672070400000,
            "time": 1672051200000
        }"#;

        let snapshot = source.parse_premium_index(body, "BTCUSDT").unwrap();
        assert_eq!(snapshot.venue, Venue::Binance);
        assert_eq!(snapshot.rate, "0.0001".parse().unwrap());
        assert_eq!(snapshot.timestamp.timestamp_millis(), 1672051200000);
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let source = BinanceFutures::new();
        assert!(matches!(
            source.parse_funding_history("not json", "BTCUSDT"),
            Err(ExchangeError::Parse(_))
        ));
    }
}
