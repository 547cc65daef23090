// exchange/mod.rs
pub mod binance;
pub mod bybit;
pub mod errors;
pub mod okx;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export main interfaces for easy access
pub use binance::BinanceFutures;
pub use bybit::BybitPerpetual;
pub use errors::ExchangeError;
pub use okx::OkxSwap;
pub use traits::FundingRateSource;

use funding_common::Venue;

/// Build the funding data source for a venue
pub fn source_for(venue: Venue) -> Box<dyn FundingRateSource> {
    match venue {
        Venue::Binance => Box::new(BinanceFutures::new()),
        Venue::Bybit => Box::new(BybitPerpetual::new()),
        Venue::Okx => Box::new(OkxSwap::new()),
    }
}
