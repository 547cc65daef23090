// funding-core/src/backtest/types.rs

use chrono::{DateTime, Utc};
use funding_common::{FundingObservation, Venue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::BacktestError;
use super::regime::MarketRegime;

// Strategy configuration for one backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub venue: Venue,
    pub symbol: String,
    pub initial_capital: Decimal,
    /// Minimum funding rate magnitude required to open a position
    pub entry_threshold: Decimal,
    /// Rate magnitude below which an open position is closed.
    /// Kept strictly below `entry_threshold` so entries and exits cannot
    /// oscillate around a single level.
    pub exit_threshold: Decimal,
    pub leverage: Decimal,
    pub position_size_pct: Decimal,
    /// When set, entries additionally require a HighVolatility or Trending
    /// regime, and a Stable regime closes open positions.
    pub use_regime_filter: bool,
}

impl StrategyConfig {
    /// Build a config with the conventional defaults: 3x leverage, 90% of
    /// capital per position, exit at half the entry threshold, no regime
    /// filter.
    pub fn new(
        venue: Venue,
        symbol: impl Into<String>,
        initial_capital: Decimal,
        entry_threshold: Decimal,
    ) -> Self {
        Self {
            venue,
            symbol: symbol.into(),
            initial_capital,
            entry_threshold,
            exit_threshold: entry_threshold / Decimal::TWO,
            leverage: Decimal::from(3),
            position_size_pct: Decimal::new(9, 1),
            use_regime_filter: false,
        }
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.exit_threshold >= self.entry_threshold {
            return Err(BacktestError::InvalidThresholds {
                entry: self.entry_threshold,
                exit: self.exit_threshold,
            });
        }
        if self.leverage <= Decimal::ZERO {
            return Err(BacktestError::InvalidLeverage(self.leverage));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(BacktestError::InvalidCapital(self.initial_capital));
        }
        if self.position_size_pct <= Decimal::ZERO || self.position_size_pct > Decimal::ONE {
            return Err(BacktestError::InvalidPositionSize(self.position_size_pct));
        }
        Ok(())
    }
}

// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionDirection {
    Flat,
    Long,
    Short,
}

impl PositionDirection {
    /// Funding cash flow sign: a Long carry position collects the funding
    /// rate when positive and pays it when negative; Short is the mirror.
    pub fn sign(&self) -> Decimal {
        match self {
            PositionDirection::Flat => Decimal::ZERO,
            PositionDirection::Long => Decimal::ONE,
            PositionDirection::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

// The single open position the simulator may hold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionState {
    pub direction: PositionDirection,
    pub notional: Decimal,
    pub entry_time: DateTime<Utc>,
    pub entry_rate: Decimal,
    pub entry_cost: Decimal,
    pub funding_collected: Decimal,
    pub periods_held: u32,
}

impl PositionState {
    pub fn open(
        direction: PositionDirection,
        notional: Decimal,
        entry_time: DateTime<Utc>,
        entry_rate: Decimal,
        entry_cost: Decimal,
    ) -> Self {
        Self {
            direction,
            notional,
            entry_time,
            entry_rate,
            entry_cost,
            funding_collected: Decimal::ZERO,
            periods_held: 0,
        }
    }

    /// Finalize this position into a completed trade record
    pub fn into_trade(
        self,
        exit_time: DateTime<Utc>,
        exit_rate: Decimal,
        exit_cost: Decimal,
    ) -> Trade {
        let net_profit = self.funding_collected - self.entry_cost - exit_cost;
        Trade {
            direction: self.direction,
            notional: self.notional,
            entry_time: self.entry_time,
            exit_time,
            entry_rate: self.entry_rate,
            exit_rate,
            funding_collected: self.funding_collected,
            entry_cost: self.entry_cost,
            exit_cost,
            net_profit,
            is_profitable: net_profit > Decimal::ZERO,
            periods_held: self.periods_held,
        }
    }
}

// A completed round trip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub direction: PositionDirection,
    pub notional: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_rate: Decimal,
    pub exit_rate: Decimal,
    pub funding_collected: Decimal,
    pub entry_cost: Decimal,
    pub exit_cost: Decimal,
    pub net_profit: Decimal,
    pub is_profitable: bool,
    pub periods_held: u32,
}

// One ledger row per input observation: the replayable audit trail of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
    pub timestamp: DateTime<Utc>,
    pub rate: Decimal,
    pub regime: MarketRegime,
    pub position: PositionDirection,
    pub notional: Decimal,
    /// +1 on a long entry bar, -1 on a short entry bar, 0 otherwise
    pub trade_signal: i8,
    pub funding_payment: Decimal,
    pub transaction_cost: Decimal,
    pub capital: Decimal,
    pub total_funding_collected: Decimal,
    pub total_transaction_costs: Decimal,
    pub portfolio_return: Decimal,
}

// Performance metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    // Returns
    pub total_return: Decimal,
    pub annualized_return: f64,
    pub funding_yield: Decimal,
    pub net_profit: Decimal,

    // Risk
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: Decimal,
    pub funding_consistency: Decimal,

    // Costs
    pub total_funding_collected: Decimal,
    pub total_transaction_costs: Decimal,
    pub cost_ratio: Decimal,

    // Trades
    pub completed_trades: u32,
    pub profitable_trades: u32,
    pub win_rate: Decimal,
    pub avg_profit_per_trade: Decimal,
    pub avg_periods_held: f64,
    pub periods_in_position: u32,
    pub trades_executed: u32,

    // Span
    pub time_span_days: i64,
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
}

// Backtest result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub config: StrategyConfig,
    pub metrics: Metrics,
    pub trades: Vec<Trade>,
    pub ledger: Vec<LedgerRow>,
    /// A position still open after the last bar is left open: capital
    /// reflects accrued funding only, with no synthetic exit cost.
    pub open_position: Option<PositionState>,
}

/// Distribution of tradeable funding periods in a history, before any
/// simulation is run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityStats {
    pub total_periods: u32,
    pub high_positive: u32,
    pub high_negative: u32,
    pub tradeable: u32,
    pub mean_rate: Decimal,
    pub max_rate: Decimal,
    pub min_rate: Decimal,
}

impl OpportunityStats {
    pub fn from_observations(observations: &[FundingObservation], threshold: Decimal) -> Self {
        let total_periods = observations.len() as u32;
        let mut high_positive = 0u32;
        let mut high_negative = 0u32;
        let mut sum = Decimal::ZERO;
        let mut max_rate = Decimal::MIN;
        let mut min_rate = Decimal::MAX;

        for obs in observations {
            sum += obs.rate;
            max_rate = max_rate.max(obs.rate);
            min_rate = min_rate.min(obs.rate);
            if obs.rate > threshold {
                high_positive += 1;
            } else if obs.rate < -threshold {
                high_negative += 1;
            }
        }

        let mean_rate = if observations.is_empty() {
            Decimal::ZERO
        } else {
            sum / Decimal::from(observations.len())
        };
        if observations.is_empty() {
            max_rate = Decimal::ZERO;
            min_rate = Decimal::ZERO;
        }

        Self {
            total_periods,
            high_positive,
            high_negative,
            tradeable: high_positive + high_negative,
            mean_rate,
            max_rate,
            min_rate,
        }
    }
}
