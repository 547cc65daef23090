// funding-core/src/backtest/engine.rs

use funding_common::FundingObservation;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::cost::CostModel;
use super::errors::BacktestError;
use super::metrics::MetricsCalculator;
use super::regime::{MarketRegime, RegimeClassifier};
use super::types::{
    BacktestResult, LedgerRow, PositionDirection, PositionState, StrategyConfig, Trade,
};

/// Sequential position simulator for the funding carry strategy.
///
/// Walks a sorted funding rate history bar by bar, holding at most one
/// hedged position at a time, and emits a per-bar ledger row plus a
/// completed trade record on each close. One engine instance owns the
/// state of exactly one run; replaying the same observations and config
/// through a fresh engine yields an identical result.
pub struct FundingBacktestEngine {
    config: StrategyConfig,
    /// Cost of one side of the hedged round trip, as a fraction of notional
    side_cost: Decimal,
    classifier: RegimeClassifier,
    metrics_calculator: MetricsCalculator,

    capital: Decimal,
    position: Option<PositionState>,
    ledger: Vec<LedgerRow>,
    trades: Vec<Trade>,
    total_funding_collected: Decimal,
    total_transaction_costs: Decimal,
}

impl FundingBacktestEngine {
    pub fn new(config: StrategyConfig, cost_model: &CostModel) -> Self {
        let side_cost = cost_model.hedged_side_cost(config.venue);
        let capital = config.initial_capital;

        Self {
            config,
            side_cost,
            classifier: RegimeClassifier::new(),
            metrics_calculator: MetricsCalculator::new(),
            capital,
            position: None,
            ledger: Vec::new(),
            trades: Vec::new(),
            total_funding_collected: Decimal::ZERO,
            total_transaction_costs: Decimal::ZERO,
        }
    }

    /// Replay the observation sequence and produce the full result.
    ///
    /// Fails fast on invalid configuration or an unsorted/empty sequence,
    /// before any state is mutated.
    pub fn run(
        mut self,
        observations: &[FundingObservation],
    ) -> Result<BacktestResult, BacktestError> {
        self.config.validate()?;
        check_ordering(observations)?;

        info!(
            "Starting funding backtest for {} on {}: {} observations",
            self.config.symbol,
            self.config.venue,
            observations.len()
        );

        for observation in observations {
            self.step(observation);
        }

        info!(
            "Backtest completed: {} completed trades, final capital {}",
            self.trades.len(),
            self.capital
        );

        let metrics = self.metrics_calculator.calculate(
            &self.ledger,
            &self.trades,
            self.config.initial_capital,
        );

        Ok(BacktestResult {
            config: self.config,
            metrics,
            trades: self.trades,
            ledger: self.ledger,
            open_position: self.position,
        })
    }

    /// Process one funding observation: entry, accrual, exit, ledger row.
    ///
    /// Entry is evaluated only while flat, before accrual, so an exit bar
    /// never re-enters within the same step. The entry bar itself accrues
    /// funding.
    fn step(&mut self, observation: &FundingObservation) {
        let rate = observation.rate;
        let (regime, _stats) = self
            .classifier
            .observe(rate.to_f64().unwrap_or(0.0));

        let mut trade_signal: i8 = 0;
        let mut funding_payment = Decimal::ZERO;
        let mut transaction_cost = Decimal::ZERO;

        // Entry, only from flat
        if self.position.is_none() {
            if let Some(direction) = self.entry_signal(rate, regime) {
                let notional =
                    self.capital * self.config.position_size_pct * self.config.leverage;
                let entry_cost = notional * self.side_cost;
                trade_signal = if direction == PositionDirection::Long { 1 } else { -1 };
                transaction_cost += entry_cost;

                debug!(
                    "Opening {:?} position: notional {}, rate {}, regime {:?}",
                    direction, notional, rate, regime
                );
                self.position = Some(PositionState::open(
                    direction,
                    notional,
                    observation.timestamp,
                    rate,
                    entry_cost,
                ));
            }
        }

        // Accrue funding on every bar a position is held, entry bar included
        if let Some(position) = self.position.as_mut() {
            funding_payment = position.notional * rate * position.direction.sign();
            position.funding_collected += funding_payment;
            position.periods_held += 1;
        }

        // Exit when the rate no longer covers costs, or the regime turned
        // unfavorable under the filtered variant
        let should_exit = self.position.is_some()
            && (rate.abs() < self.config.exit_threshold
                || (self.config.use_regime_filter && regime == MarketRegime::Stable));
        if should_exit {
            if let Some(position) = self.position.take() {
                let exit_cost = position.notional * self.side_cost;
                transaction_cost += exit_cost;

                let trade = position.into_trade(observation.timestamp, rate, exit_cost);
                debug!(
                    "Closed {:?} trade after {} periods: net profit {}",
                    trade.direction, trade.periods_held, trade.net_profit
                );
                self.trades.push(trade);
            }
        }

        // The only place capital ever changes
        self.capital += funding_payment - transaction_cost;
        self.total_funding_collected += funding_payment;
        self.total_transaction_costs += transaction_cost;

        let (position_dir, notional) = match &self.position {
            Some(position) => (position.direction, position.notional),
            None => (PositionDirection::Flat, Decimal::ZERO),
        };

        self.ledger.push(LedgerRow {
            timestamp: observation.timestamp,
            rate,
            regime,
            position: position_dir,
            notional,
            trade_signal,
            funding_payment,
            transaction_cost,
            capital: self.capital,
            total_funding_collected: self.total_funding_collected,
            total_transaction_costs: self.total_transaction_costs,
            portfolio_return: (self.capital - self.config.initial_capital)
                / self.config.initial_capital,
        });
    }

    fn entry_signal(&self, rate: Decimal, regime: MarketRegime) -> Option<PositionDirection> {
        let direction = if rate > self.config.entry_threshold {
            PositionDirection::Long
        } else if rate < -self.config.entry_threshold {
            PositionDirection::Short
        } else {
            return None;
        };

        if self.config.use_regime_filter && !regime.favors_entry() {
            return None;
        }

        Some(direction)
    }
}

fn check_ordering(observations: &[FundingObservation]) -> Result<(), BacktestError> {
    if observations.is_empty() {
        return Err(BacktestError::EmptyData);
    }
    for (i, pair) in observations.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(BacktestError::UnsortedData { index: i + 1 });
        }
    }
    Ok(())
}
