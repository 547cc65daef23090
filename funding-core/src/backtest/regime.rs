// funding-core/src/backtest/regime.rs

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default rolling window: 24 funding intervals (8 days at 8h funding)
pub const DEFAULT_WINDOW: usize = 24;

const HIGH_RATE_THRESHOLD: f64 = 0.02;
const VOLATILITY_THRESHOLD: f64 = 0.01;
const LOW_RATE_THRESHOLD: f64 = 0.005;

/// Coarse market regime label derived from recent funding rate behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRegime {
    Unknown,
    Stable,
    Normal,
    Trending,
    HighVolatility,
}

impl MarketRegime {
    /// Regimes in which the filtered strategy variant is willing to enter
    pub fn favors_entry(&self) -> bool {
        matches!(self, MarketRegime::HighVolatility | MarketRegime::Trending)
    }
}

/// Rolling mean and sample standard deviation of the trailing rate window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    pub mean_rate: f64,
    pub std_rate: f64,
}

/// Labels each funding observation with a market regime from rolling
/// statistics over the trailing window (current observation included).
///
/// Until the window has filled, statistics are undefined and every
/// observation is labelled `Unknown`.
pub struct RegimeClassifier {
    window: VecDeque<f64>,
    window_size: usize,
}

impl RegimeClassifier {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window_size: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Push the next observation and classify it.
    ///
    /// Evaluated in order, first match wins:
    /// 1. window not yet full -> Unknown
    /// 2. |rate| > 2%          -> HighVolatility if std > 1%, else Trending
    /// 3. |rate| < 0.5%        -> Stable
    /// 4. otherwise            -> Normal
    pub fn observe(&mut self, rate: f64) -> (MarketRegime, Option<RollingStats>) {
        self.window.push_back(rate);
        if self.window.len() > self.window_size {
            self.window.pop_front();
        }

        let stats = self.rolling_stats();
        let regime = match stats {
            None => MarketRegime::Unknown,
            Some(stats) => {
                if rate.abs() > HIGH_RATE_THRESHOLD {
                    if stats.std_rate > VOLATILITY_THRESHOLD {
                        MarketRegime::HighVolatility
                    } else {
                        MarketRegime::Trending
                    }
                } else if rate.abs() < LOW_RATE_THRESHOLD {
                    MarketRegime::Stable
                } else {
                    MarketRegime::Normal
                }
            }
        };

        (regime, stats)
    }

    fn rolling_stats(&self) -> Option<RollingStats> {
        if self.window.len() < self.window_size {
            return None;
        }

        let n = self.window.len() as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        // Sample variance (n-1 divisor)
        let variance = self
            .window
            .iter()
            .map(|rate| (rate - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);

        Some(RollingStats {
            mean_rate: mean,
            std_rate: variance.sqrt(),
        })
    }
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_until_window_full() {
        let mut classifier = RegimeClassifier::new();
        for _ in 0..DEFAULT_WINDOW - 1 {
            let (regime, stats) = classifier.observe(0.025);
            assert_eq!(regime, MarketRegime::Unknown);
            assert!(stats.is_none());
        }
        let (regime, stats) = classifier.observe(0.025);
        assert_ne!(regime, MarketRegime::Unknown);
        assert!(stats.is_some());
    }

    #[test]
    fn test_trending_vs_high_volatility() {
        // Constant high rate: zero std -> Trending
        let mut classifier = RegimeClassifier::with_window(4);
        let mut last = MarketRegime::Unknown;
        for _ in 0..4 {
            last = classifier.observe(0.025).0;
        }
        assert_eq!(last, MarketRegime::Trending);

        // High rate with a volatile window -> HighVolatility
        let mut classifier = RegimeClassifier::with_window(4);
        for rate in [0.03, -0.03, 0.03] {
            classifier.observe(rate);
        }
        let (regime, stats) = classifier.observe(0.03);
        assert!(stats.unwrap().std_rate > 0.01);
        assert_eq!(regime, MarketRegime::HighVolatility);
    }

    #[test]
    fn test_stable_and_normal() {
        let mut classifier = RegimeClassifier::with_window(4);
        for _ in 0..4 {
            classifier.observe(0.001);
        }
        assert_eq!(classifier.observe(0.001).0, MarketRegime::Stable);
        assert_eq!(classifier.observe(0.01).0, MarketRegime::Normal);
        // Negative rates classify on magnitude
        assert_eq!(classifier.observe(-0.001).0, MarketRegime::Stable);
    }

    #[test]
    fn test_window_slides() {
        let mut classifier = RegimeClassifier::with_window(3);
        for rate in [0.5, 0.5, 0.5] {
            classifier.observe(rate);
        }
        // Old extreme values fall out of the window
        classifier.observe(0.001);
        classifier.observe(0.001);
        let (_, stats) = classifier.observe(0.001);
        let stats = stats.unwrap();
        assert!((stats.mean_rate - 0.001).abs() < 1e-12);
        assert!(stats.std_rate < 1e-12);
    }
}
