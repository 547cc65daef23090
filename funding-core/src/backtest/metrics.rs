// funding-core/src/backtest/metrics.rs

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::types::{LedgerRow, Metrics, PositionDirection, Trade};

/// Pure metrics computation over a completed run's ledger and trade log.
///
/// Degenerate inputs never produce NaN or infinity: zero time span, zero
/// volatility and zero funding collected all yield a defined 0 for the
/// affected metric.
pub struct MetricsCalculator {
    days_per_year: f64,
}

impl MetricsCalculator {
    pub fn new() -> Self {
        Self { days_per_year: 365.25 }
    }

    pub fn calculate(
        &self,
        ledger: &[LedgerRow],
        trades: &[Trade],
        initial_capital: Decimal,
    ) -> Metrics {
        let final_capital = ledger
            .last()
            .map(|row| row.capital)
            .unwrap_or(initial_capital);
        let total_funding_collected = ledger
            .last()
            .map(|row| row.total_funding_collected)
            .unwrap_or(Decimal::ZERO);
        let total_transaction_costs = ledger
            .last()
            .map(|row| row.total_transaction_costs)
            .unwrap_or(Decimal::ZERO);

        let total_return = (final_capital - initial_capital) / initial_capital;
        let time_span_days = self.time_span_days(ledger);
        let returns = self.bar_returns(ledger);
        let volatility = self.volatility(&returns);
        let (completed, profitable) = self.trade_counts(trades);

        Metrics {
            total_return,
            annualized_return: self.annualized_return(total_return, time_span_days),
            funding_yield: total_funding_collected / initial_capital,
            net_profit: total_funding_collected - total_transaction_costs,

            volatility,
            sharpe_ratio: self.sharpe_ratio(&returns, volatility),
            max_drawdown: self.max_drawdown(ledger),
            funding_consistency: self.funding_consistency(ledger),

            total_funding_collected,
            total_transaction_costs,
            cost_ratio: self.cost_ratio(total_transaction_costs, total_funding_collected),

            completed_trades: completed,
            profitable_trades: profitable,
            win_rate: self.win_rate(profitable, completed),
            avg_profit_per_trade: self.avg_profit_per_trade(trades),
            avg_periods_held: self.avg_periods_held(trades),
            periods_in_position: ledger
                .iter()
                .filter(|row| row.position != PositionDirection::Flat)
                .count() as u32,
            trades_executed: self.trades_executed(ledger, trades),

            time_span_days,
            initial_capital,
            final_capital,
        }
    }

    fn time_span_days(&self, ledger: &[LedgerRow]) -> i64 {
        match (ledger.first(), ledger.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days(),
            _ => 0,
        }
    }

    fn annualized_return(&self, total_return: Decimal, time_span_days: i64) -> f64 {
        if time_span_days <= 0 {
            return 0.0;
        }
        let total_return = total_return.to_f64().unwrap_or(0.0);
        (1.0 + total_return).powf(self.days_per_year / time_span_days as f64) - 1.0
    }

    /// First difference of the running portfolio return
    fn bar_returns(&self, ledger: &[LedgerRow]) -> Vec<f64> {
        ledger
            .windows(2)
            .map(|window| {
                (window[1].portfolio_return - window[0].portfolio_return)
                    .to_f64()
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Sample standard deviation of the per-bar returns
    fn volatility(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns
            .iter()
            .map(|r| (r - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        variance.sqrt()
    }

    fn sharpe_ratio(&self, returns: &[f64], volatility: f64) -> f64 {
        if returns.is_empty() || volatility == 0.0 {
            return 0.0;
        }
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        mean / volatility
    }

    /// Largest peak-relative capital decline, as a non-positive fraction
    fn max_drawdown(&self, ledger: &[LedgerRow]) -> Decimal {
        let mut max_drawdown = Decimal::ZERO;
        let mut peak = Decimal::MIN;

        for row in ledger {
            peak = peak.max(row.capital);
            if peak > Decimal::ZERO {
                let drawdown = (row.capital - peak) / peak;
                max_drawdown = max_drawdown.min(drawdown);
            }
        }

        max_drawdown
    }

    /// Fraction of bars with strictly positive funding payment
    fn funding_consistency(&self, ledger: &[LedgerRow]) -> Decimal {
        if ledger.is_empty() {
            return Decimal::ZERO;
        }
        let positive = ledger
            .iter()
            .filter(|row| row.funding_payment > Decimal::ZERO)
            .count();
        Decimal::from(positive) / Decimal::from(ledger.len())
    }

    fn cost_ratio(&self, total_costs: Decimal, total_funding: Decimal) -> Decimal {
        if total_funding <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        total_costs / total_funding
    }

    fn trade_counts(&self, trades: &[Trade]) -> (u32, u32) {
        let profitable = trades.iter().filter(|trade| trade.is_profitable).count();
        (trades.len() as u32, profitable as u32)
    }

    fn win_rate(&self, profitable: u32, completed: u32) -> Decimal {
        if completed == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(profitable) / Decimal::from(completed)
    }

    fn avg_profit_per_trade(&self, trades: &[Trade]) -> Decimal {
        if trades.is_empty() {
            return Decimal::ZERO;
        }
        trades.iter().map(|trade| trade.net_profit).sum::<Decimal>()
            / Decimal::from(trades.len())
    }

    fn avg_periods_held(&self, trades: &[Trade]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }
        trades.iter().map(|trade| trade.periods_held as f64).sum::<f64>()
            / trades.len() as f64
    }

    /// Entries plus exits, the execution count the ledger implies
    fn trades_executed(&self, ledger: &[LedgerRow], trades: &[Trade]) -> u32 {
        let entries = ledger.iter().filter(|row| row.trade_signal != 0).count() as u32;
        entries + trades.len() as u32
    }
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::regime::MarketRegime;
    use chrono::{Duration, TimeZone, Utc};

    fn row(hours: i64, capital: &str, funding_payment: &str, transaction_cost: &str) -> LedgerRow {
        let initial = Decimal::from(10000);
        let capital: Decimal = capital.parse().unwrap();
        LedgerRow {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                + Duration::hours(hours),
            rate: "0.0001".parse().unwrap(),
            regime: MarketRegime::Unknown,
            position: PositionDirection::Flat,
            notional: Decimal::ZERO,
            trade_signal: 0,
            funding_payment: funding_payment.parse().unwrap(),
            transaction_cost: transaction_cost.parse().unwrap(),
            capital,
            total_funding_collected: Decimal::ZERO,
            total_transaction_costs: Decimal::ZERO,
            portfolio_return: (capital - initial) / initial,
        }
    }

    fn trade(net_profit: &str, periods_held: u32) -> Trade {
        let net_profit: Decimal = net_profit.parse().unwrap();
        Trade {
            direction: PositionDirection::Long,
            notional: Decimal::from(27000),
            entry_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            exit_time: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            entry_rate: "0.001".parse().unwrap(),
            exit_rate: "0.0001".parse().unwrap(),
            funding_collected: net_profit + Decimal::from(10),
            entry_cost: Decimal::from(5),
            exit_cost: Decimal::from(5),
            net_profit,
            is_profitable: net_profit > Decimal::ZERO,
            periods_held,
        }
    }

    #[test]
    fn test_total_and_annualized_return() {
        let calculator = MetricsCalculator::new();
        // 10% over ~365 days
        let ledger = vec![row(0, "10000", "0", "0"), row(365 * 24, "11000", "0", "0")];
        let metrics = calculator.calculate(&ledger, &[], Decimal::from(10000));

        assert_eq!(metrics.total_return, "0.1".parse().unwrap());
        assert_eq!(metrics.time_span_days, 365);
        let expected = 1.1_f64.powf(365.25 / 365.0) - 1.0;
        assert!((metrics.annualized_return - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_time_span_returns_zero_annualized() {
        let calculator = MetricsCalculator::new();
        let ledger = vec![row(0, "10000", "0", "0"), row(1, "11000", "0", "0")];
        let metrics = calculator.calculate(&ledger, &[], Decimal::from(10000));
        // One hour apart: zero whole days
        assert_eq!(metrics.time_span_days, 0);
        assert_eq!(metrics.annualized_return, 0.0);
    }

    #[test]
    fn test_flat_capital_has_zero_volatility_and_sharpe() {
        let calculator = MetricsCalculator::new();
        let ledger: Vec<LedgerRow> =
            (0..5).map(|i| row(i * 8, "10000", "0", "0")).collect();
        let metrics = calculator.calculate(&ledger, &[], Decimal::from(10000));

        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        let calculator = MetricsCalculator::new();
        let ledger = vec![
            row(0, "10000", "0", "0"),
            row(8, "11000", "0", "0"),
            row(16, "10450", "0", "0"),
            row(24, "10900", "0", "0"),
        ];
        let metrics = calculator.calculate(&ledger, &[], Decimal::from(10000));
        // (10450 - 11000) / 11000
        assert_eq!(metrics.max_drawdown, "-0.05".parse().unwrap());
    }

    #[test]
    fn test_cost_ratio_defined_without_funding() {
        let calculator = MetricsCalculator::new();
        let mut last = row(8, "9990", "0", "10");
        last.total_transaction_costs = Decimal::from(10);
        let ledger = vec![row(0, "10000", "0", "0"), last];
        let metrics = calculator.calculate(&ledger, &[], Decimal::from(10000));

        assert_eq!(metrics.cost_ratio, Decimal::ZERO);
        assert_eq!(metrics.total_transaction_costs, Decimal::from(10));
    }

    #[test]
    fn test_funding_consistency_counts_strictly_positive_bars() {
        let calculator = MetricsCalculator::new();
        let ledger = vec![
            row(0, "10005", "5", "0"),
            row(8, "10005", "0", "0"),
            row(16, "10002", "-3", "0"),
            row(24, "10009", "7", "0"),
        ];
        let metrics = calculator.calculate(&ledger, &[], Decimal::from(10000));
        assert_eq!(metrics.funding_consistency, "0.5".parse().unwrap());
    }

    #[test]
    fn test_trade_statistics() {
        let calculator = MetricsCalculator::new();
        let ledger = vec![row(0, "10000", "0", "0")];
        let trades = vec![trade("10", 4), trade("-4", 2), trade("6", 3)];
        let metrics = calculator.calculate(&ledger, &trades, Decimal::from(10000));

        assert_eq!(metrics.completed_trades, 3);
        assert_eq!(metrics.profitable_trades, 2);
        assert_eq!(metrics.win_rate, Decimal::from(2) / Decimal::from(3));
        assert_eq!(metrics.avg_profit_per_trade, Decimal::from(4));
        assert!((metrics.avg_periods_held - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_trades_yields_zero_rates() {
        let calculator = MetricsCalculator::new();
        let ledger = vec![row(0, "10000", "0", "0")];
        let metrics = calculator.calculate(&ledger, &[], Decimal::from(10000));

        assert_eq!(metrics.win_rate, Decimal::ZERO);
        assert_eq!(metrics.avg_profit_per_trade, Decimal::ZERO);
        assert_eq!(metrics.avg_periods_held, 0.0);
        assert_eq!(metrics.trades_executed, 0);
    }
}
