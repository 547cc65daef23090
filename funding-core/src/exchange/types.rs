// =================================================================
// exchange/types.rs - Wire Data Structures
// =================================================================

use serde::Deserialize;

/// One entry of Binance's `/fapi/v1/fundingRate` response
#[derive(Debug, Deserialize, Clone)]
pub struct BinanceFundingEntry {
    pub symbol: String,

    /// Funding settlement time, epoch milliseconds
    #[serde(rename = "fundingTime")]
    pub funding_time: i64,

    /// Funding rate as a decimal string, e.g. "0.00010000"
    #[serde(rename = "fundingRate")]
    pub funding_rate: String,
}

/// Binance `/fapi/v1/premiumIndex` response
#[derive(Debug, Deserialize, Clone)]
pub struct BinancePremiumIndex {
    pub symbol: String,

    #[serde(rename = "lastFundingRate")]
    pub last_funding_rate: String,

    #[serde(rename = "nextFundingTime")]
    pub next_funding_time: i64,

    /// Server time, epoch milliseconds
    pub time: i64,
}

/// Bybit v5 response envelope
#[derive(Debug, Deserialize)]
pub struct BybitResponse<T> {
    #[serde(rename = "retCode")]
    pub ret_code: i64,

    #[serde(rename = "retMsg")]
    pub ret_msg: String,

    pub result: T,

    /// Server time, epoch milliseconds
    pub time: i64,
}

#[derive(Debug, Deserialize)]
pub struct BybitFundingHistoryResult {
    pub list: Vec<BybitFundingEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BybitFundingEntry {
    pub symbol: String,

    #[serde(rename = "fundingRate")]
    pub funding_rate: String,

    /// Epoch milliseconds, as a string
    #[serde(rename = "fundingRateTimestamp")]
    pub funding_rate_timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct BybitTickersResult {
    pub list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BybitTicker {
    pub symbol: String,

    #[serde(rename = "fundingRate")]
    pub funding_rate: String,
}

/// OKX v5 response envelope; errors are reported in-band via `code`
#[derive(Debug, Deserialize)]
pub struct OkxResponse<T> {
    pub code: String,
    pub msg: String,
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OkxFundingEntry {
    #[serde(rename = "instId")]
    pub inst_id: String,

    #[serde(rename = "fundingRate")]
    pub funding_rate: String,

    /// Epoch milliseconds, as a string
    #[serde(rename = "fundingTime")]
    pub funding_time: String,
}
