// =================================================================
// exchange/okx.rs - OKX Perpetual Swap Funding Data
// =================================================================

use async_trait::async_trait;
use funding_common::{FundingObservation, RateSnapshot, Venue};
use tracing::debug;

use super::{
    errors::ExchangeError,
    traits::FundingRateSource,
    types::{OkxFundingEntry, OkxResponse},
    utils::{parse_millis_str, parse_rate, to_okx_inst_id},
};

// Constants
const OKX_API_URL: &str = "https://www.okx.com";

/// OKX perpetual swap funding data source (v5 public API)
pub struct OkxSwap {
    api_url: String,
    client: reqwest::Client,
}

impl OkxSwap {
    pub fn new() -> Self {
        Self {
            api_url: OKX_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn parse_entries(
        &self,
        body: &str,
        symbol: &str,
    ) -> Result<Vec<OkxFundingEntry>, ExchangeError> {
        let response: OkxResponse<OkxFundingEntry> = serde_json::from_str(body)
            .map_err(|e| ExchangeError::Parse(format!("Funding data: {}", e)))?;
        if response.code != "0" {
            return Err(ExchangeError::Api(response.msg));
        }
        if response.data.is_empty() {
            return Err(ExchangeError::NoData {
                venue: self.venue(),
                symbol: symbol.to_string(),
            });
        }
        Ok(response.data)
    }

    fn parse_funding_history(
        &self,
        body: &str,
        symbol: &str,
    ) -> Result<Vec<FundingObservation>, ExchangeError> {
        let mut observations = self
            .parse_entries(body, symbol)?
            .iter()
            .map(|entry| {
                Ok(FundingObservation::new(
                    parse_millis_str(&entry.funding_time)?,
                    parse_rate(&entry.funding_rate)?,
                ))
            })
            .collect::<Result<Vec<_>, ExchangeError>>()?;

        observations.sort_by_key(|observation| observation.timestamp);
        Ok(observations)
    }

    fn parse_snapshot(&self, body: &str, symbol: &str) -> Result<RateSnapshot, ExchangeError> {
        let entries = self.parse_entries(body, symbol)?;
        let entry = &entries[0];

        Ok(RateSnapshot {
            venue: self.venue(),
            symbol: symbol.to_string(),
            rate: parse_rate(&entry.funding_rate)?,
            timestamp: parse_millis_str(&entry.funding_time)?,
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
impl FundingRateSource for OkxSwap {
    fn venue(&self) -> Venue {
        Venue::Okx
    }

    async fn funding_rate_history(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<FundingObservation>, ExchangeError> {
        let inst_id = to_okx_inst_id(symbol)?;
        let limit = limit.to_string();
        debug!("Fetching OKX funding history for {}", inst_id);

        let body = self
            .get(
                "/api/v5/public/funding-rate-history",
                &[("instId", inst_id.as_str()), ("limit", limit.as_str())],
            )
            .await?;
        self.parse_funding_history(&body, symbol)
    }

    async fn current_funding_rate(
        &self,
        symbol: &str,
    ) -> Result<RateSnapshot, ExchangeError> {
        let inst_id = to_okx_inst_id(symbol)?;
        let body = self
            .get(
                "/api/v5/public/funding-rate",
                &[("instId", inst_id.as_str())],
            )
            .await?;
        self.parse_snapshot(&body, symbol)
    }
}

impl Default for OkxSwap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_funding_history() {
        let source = OkxSwap::new();

        let body = r#"{
            "code": "0",
            "msg": "",
            "data": [
                {
                    "instId": "BTC-USDT-SWAP",
                    "fundingRate": "0.0003",
                    "fundingTime": "1672070400000"
                },
                {
                    "instId": "BTC-USDT-SWAP",
                    "fundingRate": "0.0001",
                    "fundingTime": "1672041600000"
                }
            ]
        }"#;

        let observations = source.parse_funding_history(body, "BTCUSDT").unwrap();
        assert_eq!(observations.len(), 2);
        assert!(observations[0].timestamp < observations[1].timestamp);
        assert_eq!(observations[1].rate, "0.0003".parse().unwrap());
    }

    #[test]
    fn test_in_band_error_code() {
        let source = OkxSwap::new();

        let body = r#"{
            "code": "51001",
            "msg": "Instrument ID does not exist",
            "data": []
        }"#;

        match source.parse_funding_history(body, "BTCUSDT") {
            Err(ExchangeError::Api(msg)) => assert!(msg.contains("does not exist")),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_snapshot() {
        let source = OkxSwap::new();

        let body = r#"{
            "code": "0",
            "msg": "",
            "data": [
                {
                    "instId": "BTC-USDT-SWAP",
                    "fundingRate": "0.00012",
                    "fundingTime": "1672070400000"
                }
            ]
        }"#;

        let snapshot = source.parse_snapshot(body, "BTCUSDT").unwrap();
        assert_eq!(snapshot.venue, Venue::Okx);
        assert_eq!(snapshot.symbol, "BTCUSDT");
        assert_eq!(snapshot.rate, "0.00012".parse().unwrap());
    }

    #[test]
    fn test_empty_data_is_no_data() {
        let source = OkxSwap::new();

        let body = r#"{ "code": "0", "msg": "", "data": [] }"#;
        assert!(matches!(
            source.parse_funding_history(body, "BTCUSDT"),
            Err(ExchangeError::NoData { .. })
        ));
    }
}
