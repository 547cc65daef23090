// =================================================================
// exchange/utils.rs - Shared Parsing and Validation Helpers
// =================================================================

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::errors::ExchangeError;

/// Validate and normalize a perpetual symbol ("btcusdt" -> "BTCUSDT")
pub fn validate_symbol(symbol: &str) -> Result<String, ExchangeError> {
    let normalized = symbol.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(ExchangeError::InvalidSymbol("Empty symbol".to_string()));
    }
    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ExchangeError::InvalidSymbol(symbol.to_string()));
    }
    Ok(normalized)
}

/// Map a concatenated symbol to OKX's instrument id:
/// "BTCUSDT" -> "BTC-USDT-SWAP"
pub fn to_okx_inst_id(symbol: &str) -> Result<String, ExchangeError> {
    let symbol = validate_symbol(symbol)?;
    for quote in ["USDT", "USDC", "USD"] {
        if let Some(base) = symbol.strip_suffix(quote) {
            if !base.is_empty() {
                return Ok(format!("{}-{}-SWAP", base, quote));
            }
        }
    }
    Err(ExchangeError::InvalidSymbol(format!(
        "Cannot derive OKX instrument id from {}",
        symbol
    )))
}

/// Parse a funding rate decimal string like "0.00010000"
pub fn parse_rate(raw: &str) -> Result<Decimal, ExchangeError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| ExchangeError::Parse(format!("Bad funding rate {:?}: {}", raw, e)))
}

/// Convert epoch milliseconds to a UTC timestamp
pub fn parse_millis(millis: i64) -> Result<DateTime<Utc>, ExchangeError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ExchangeError::Parse(format!("Bad timestamp: {}", millis)))
}

/// Convert epoch milliseconds serialized as a string (Bybit, OKX)
pub fn parse_millis_str(raw: &str) -> Result<DateTime<Utc>, ExchangeError> {
    let millis: i64 = raw
        .trim()
        .parse()
        .map_err(|e| ExchangeError::Parse(format!("Bad timestamp {:?}: {}", raw, e)))?;
    parse_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_validation() {
        assert_eq!(validate_symbol("BTCUSDT").unwrap(), "BTCUSDT");
        assert_eq!(validate_symbol("btcusdt").unwrap(), "BTCUSDT");
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("BTC-USDT").is_err());
    }

    #[test]
    fn test_okx_inst_id_mapping() {
        assert_eq!(to_okx_inst_id("BTCUSDT").unwrap(), "BTC-USDT-SWAP");
        assert_eq!(to_okx_inst_id("ethusdc").unwrap(), "ETH-USDC-SWAP");
        assert!(to_okx_inst_id("USDT").is_err());
        assert!(to_okx_inst_id("BTCEUR").is_err());
    }

    #[test]
    fn test_rate_parsing() {
        assert_eq!(parse_rate("0.00010000").unwrap(), "0.0001".parse().unwrap());
        assert_eq!(parse_rate("-0.0025").unwrap(), "-0.0025".parse().unwrap());
        assert!(parse_rate("1.2e-4").is_err());
        assert!(parse_rate("").is_err());
    }

    #[test]
    fn test_millis_parsing() {
        let ts = parse_millis(1672515782136).unwrap();
        assert_eq!(ts.timestamp_millis(), 1672515782136);
        assert_eq!(parse_millis_str("1672515782136").unwrap(), ts);
        assert!(parse_millis_str("not-a-number").is_err());
    }
}
