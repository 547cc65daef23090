pub mod spread;

pub use spread::{CrossExchangeSpreadAnalyzer, SpreadAnalysis, SpreadOpportunity};
