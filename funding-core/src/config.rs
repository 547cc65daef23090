use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Per-venue cost schedule, all values as fractions of notional.
/// Commissions come from the exchange fee schedule; spread is an estimate.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueCosts {
    pub commission_futures: f64,
    pub commission_spot: f64,
    pub spread_cost: f64,
}

/// Strategy defaults, overridable per run from the command line
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyDefaults {
    pub initial_capital: f64,
    pub entry_threshold: f64,
    pub leverage: f64,
    pub position_size_pct: f64,
    pub use_regime_filter: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub venues: HashMap<String, VenueCosts>,
    pub strategy: StrategyDefaults,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(true))
            .add_source(Environment::with_prefix("FUNDING").separator("__"));

        let s = builder.build()?;
        s.try_deserialize()
    }
}
