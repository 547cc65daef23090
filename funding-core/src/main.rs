use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{info, warn};

use funding_common::Venue;
use funding_core::{
    analysis::{CrossExchangeSpreadAnalyzer, SpreadAnalysis},
    backtest::{
        BacktestResult, CostModel, FundingBacktestEngine, OpportunityStats, StrategyConfig,
    },
    config::Settings,
    exchange,
};

#[derive(Parser)]
#[command(name = "funding-arb")]
#[command(about = "A market-neutral funding rate carry strategy backtester")]
enum Commands {
    /// Replay historical funding rates through the carry strategy
    Backtest {
        #[arg(short, long, default_value = "BTCUSDT")]
        symbol: String,
        #[arg(short, long, default_value = "binance")]
        venue: String,
        /// Number of funding periods to fetch
        #[arg(short, long, default_value = "1000")]
        limit: u32,
        #[arg(long)]
        initial_capital: Option<String>,
        #[arg(long)]
        entry_threshold: Option<String>,
        #[arg(long)]
        leverage: Option<String>,
        #[arg(long)]
        position_size_pct: Option<String>,
        /// Require a favorable market regime on entry and exit on a
        /// Stable regime
        #[arg(long)]
        use_regime_filter: bool,
    },
    /// Compare live funding rates across venues for one instrument
    Spread {
        #[arg(short, long, default_value = "BTCUSDT")]
        symbol: String,
        #[arg(long, value_delimiter = ',', default_value = "binance,bybit,okx")]
        venues: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;
    let cost_model = CostModel::from_settings(&settings)?;

    match Commands::parse() {
        Commands::Backtest {
            symbol,
            venue,
            limit,
            initial_capital,
            entry_threshold,
            leverage,
            position_size_pct,
            use_regime_filter,
        } => {
            let venue = Venue::from_str(&venue)?;
            let source = exchange::source_for(venue);

            let observations = source.funding_rate_history(&symbol, limit).await?;
            info!(
                "Fetched {} funding observations for {} on {}",
                observations.len(),
                symbol,
                venue
            );

            let mut config = StrategyConfig::new(
                venue,
                symbol,
                decimal_arg(initial_capital, settings.strategy.initial_capital)?,
                decimal_arg(entry_threshold, settings.strategy.entry_threshold)?,
            );
            config.leverage = decimal_arg(leverage, settings.strategy.leverage)?;
            config.position_size_pct =
                decimal_arg(position_size_pct, settings.strategy.position_size_pct)?;
            config.use_regime_filter = use_regime_filter || settings.strategy.use_regime_filter;

            let opportunities =
                OpportunityStats::from_observations(&observations, config.entry_threshold);

            let engine = FundingBacktestEngine::new(config, &cost_model);
            let result = engine.run(&observations)?;

            print_opportunities(&opportunities);
            print_backtest_report(&result);
        }

        Commands::Spread { symbol, venues } => {
            let mut rates = BTreeMap::new();

            println!("\nCurrent funding rates for {}:", symbol);
            for name in &venues {
                let venue = match Venue::from_str(name) {
                    Ok(venue) => venue,
                    Err(e) => {
                        warn!("{}", e);
                        continue;
                    }
                };
                match exchange::source_for(venue).current_funding_rate(&symbol).await {
                    Ok(snapshot) => {
                        println!(
                            "  {:>8}: {}%",
                            venue,
                            snapshot.rate * Decimal::ONE_HUNDRED
                        );
                        rates.insert(venue, snapshot.rate);
                    }
                    Err(e) => warn!("{}: {}", venue, e),
                }
            }

            let analyzer = CrossExchangeSpreadAnalyzer::new(&cost_model);
            print_spread_analysis(&analyzer.analyze(&rates));
        }
    }

    Ok(())
}

/// CLI override if given, otherwise the configured default
fn decimal_arg(arg: Option<String>, default: f64) -> Result<Decimal> {
    match arg {
        Some(raw) => Decimal::from_str(&raw).with_context(|| format!("Bad decimal: {}", raw)),
        None => Ok(Decimal::try_from(default)?),
    }
}

fn print_opportunities(stats: &OpportunityStats) {
    println!("\nFunding Rate Opportunities:");
    println!("  Total Periods: {}", stats.total_periods);
    println!("  High Positive Funding: {}", stats.high_positive);
    println!("  High Negative Funding: {}", stats.high_negative);
    println!("  Tradeable Opportunities: {}", stats.tradeable);
    println!(
        "  Mean Rate: {}%  Max: {}%  Min: {}%",
        stats.mean_rate * Decimal::ONE_HUNDRED,
        stats.max_rate * Decimal::ONE_HUNDRED,
        stats.min_rate * Decimal::ONE_HUNDRED
    );
}

fn print_backtest_report(result: &BacktestResult) {
    let metrics = &result.metrics;

    println!("\nBacktest Results:");
    println!("  Initial Capital: ${}", metrics.initial_capital);
    println!("  Final Capital: ${}", metrics.final_capital);
    println!(
        "  Total Return: {}%",
        metrics.total_return * Decimal::ONE_HUNDRED
    );
    println!(
        "  Annualized Return: {:.4}%",
        metrics.annualized_return * 100.0
    );
    println!(
        "  Funding Yield: {}%",
        metrics.funding_yield * Decimal::ONE_HUNDRED
    );
    println!("  Net Profit: ${}", metrics.net_profit);

    println!("\nRisk:");
    println!("  Sharpe Ratio: {:.4}", metrics.sharpe_ratio);
    println!("  Volatility: {:.6}", metrics.volatility);
    println!(
        "  Max Drawdown: {}%",
        metrics.max_drawdown * Decimal::ONE_HUNDRED
    );
    println!(
        "  Funding Consistency: {}%",
        metrics.funding_consistency * Decimal::ONE_HUNDRED
    );

    println!("\nCosts:");
    println!(
        "  Total Funding Collected: ${}",
        metrics.total_funding_collected
    );
    println!(
        "  Total Transaction Costs: ${}",
        metrics.total_transaction_costs
    );
    println!(
        "  Cost Ratio: {}%",
        metrics.cost_ratio * Decimal::ONE_HUNDRED
    );

    println!("\nTrades:");
    println!("  Completed Trades: {}", metrics.completed_trades);
    println!("  Profitable Trades: {}", metrics.profitable_trades);
    println!("  Win Rate: {}%", metrics.win_rate * Decimal::ONE_HUNDRED);
    println!("  Avg Profit per Trade: ${}", metrics.avg_profit_per_trade);
    println!("  Avg Periods Held: {:.1}", metrics.avg_periods_held);
    println!("  Periods in Position: {}", metrics.periods_in_position);
    println!("  Trade Executions: {}", metrics.trades_executed);
    println!("  Time Span: {} days", metrics.time_span_days);

    println!("\nTrade History:");
    for trade in &result.trades {
        println!(
            "  {} -> {} {:?} notional {} net profit {}",
            trade.entry_time.format("%Y-%m-%d %H:%M"),
            trade.exit_time.format("%Y-%m-%d %H:%M"),
            trade.direction,
            trade.notional,
            trade.net_profit
        );
    }
    if let Some(open) = &result.open_position {
        println!(
            "  Still open: {:?} since {} with {} funding accrued",
            open.direction,
            open.entry_time.format("%Y-%m-%d %H:%M"),
            open.funding_collected
        );
    }
}

fn print_spread_analysis(analysis: &SpreadAnalysis) {
    println!("\nCross-Exchange Spread Analysis:");
    match analysis {
        SpreadAnalysis::InsufficientData { venues_with_data } => {
            println!(
                "  Insufficient data: need at least 2 venues, got {}",
                venues_with_data
            );
        }
        SpreadAnalysis::Opportunity(opportunity) => {
            println!(
                "  Highest Rate: {}% ({})",
                opportunity.high_rate * Decimal::ONE_HUNDRED,
                opportunity.short_venue
            );
            println!(
                "  Lowest Rate: {}% ({})",
                opportunity.low_rate * Decimal::ONE_HUNDRED,
                opportunity.long_venue
            );
            println!(
                "  Gross Spread: {}%",
                opportunity.gross_spread * Decimal::ONE_HUNDRED
            );
            println!(
                "  Transaction Costs: {}%",
                opportunity.total_cost * Decimal::ONE_HUNDRED
            );
            println!(
                "  Net Spread: {}%",
                opportunity.net_spread * Decimal::ONE_HUNDRED
            );
            if opportunity.is_profitable {
                println!(
                    "  PROFITABLE: short {}, long {}",
                    opportunity.short_venue, opportunity.long_venue
                );
            } else {
                println!("  Not profitable after costs");
            }
        }
    }
}
