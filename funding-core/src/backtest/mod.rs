pub mod cost;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod regime;
pub mod types;

pub use cost::{CostModel, InstrumentLeg};
pub use engine::FundingBacktestEngine;
pub use errors::BacktestError;
pub use regime::{MarketRegime, RegimeClassifier, RollingStats};
pub use types::{
    BacktestResult, LedgerRow, Metrics, OpportunityStats, PositionDirection, PositionState,
    StrategyConfig, Trade,
};
