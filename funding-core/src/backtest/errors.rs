// =================================================================
// backtest/errors.rs - Error Types
// =================================================================

use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for backtest runs.
///
/// Every variant is a precondition violation: the simulator is a pure
/// transformation and never retries. Configuration errors surface before
/// any state is mutated.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Exit threshold {exit} must be strictly below entry threshold {entry}")]
    InvalidThresholds { entry: Decimal, exit: Decimal },

    #[error("Leverage must be positive, got {0}")]
    InvalidLeverage(Decimal),

    #[error("Initial capital must be positive, got {0}")]
    InvalidCapital(Decimal),

    #[error("Position size must be in (0, 1], got {0}")]
    InvalidPositionSize(Decimal),

    #[error("Empty observation sequence")]
    EmptyData,

    #[error("Observations not sorted by timestamp at index {index}")]
    UnsortedData { index: usize },
}
