// funding-core/src/analysis/spread.rs

use funding_common::Venue;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::backtest::cost::{CostModel, InstrumentLeg};

/// Best instantaneous two-sided funding spread across venues, net of the
/// futures-leg cost on both sides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadOpportunity {
    /// Venue with the highest rate: short the perpetual here
    pub short_venue: Venue,
    /// Venue with the lowest rate: long the perpetual here
    pub long_venue: Venue,
    pub high_rate: Decimal,
    pub low_rate: Decimal,
    pub gross_spread: Decimal,
    pub total_cost: Decimal,
    pub net_spread: Decimal,
    pub is_profitable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpreadAnalysis {
    /// Fewer than two venues reported a rate
    InsufficientData { venues_with_data: usize },
    Opportunity(SpreadOpportunity),
}

/// Compares concurrent funding rates across venues for one instrument.
/// Independent of the sequential simulator; only the cost model is shared.
pub struct CrossExchangeSpreadAnalyzer<'a> {
    cost_model: &'a CostModel,
}

impl<'a> CrossExchangeSpreadAnalyzer<'a> {
    pub fn new(cost_model: &'a CostModel) -> Self {
        Self { cost_model }
    }

    /// Analyze a single snapshot of venue rates.
    ///
    /// Ties resolve to the first venue in `Venue` order, so the result is
    /// deterministic for a given snapshot.
    pub fn analyze(&self, rates: &BTreeMap<Venue, Decimal>) -> SpreadAnalysis {
        if rates.len() < 2 {
            return SpreadAnalysis::InsufficientData {
                venues_with_data: rates.len(),
            };
        }

        let mut entries = rates.iter();
        let Some((&first_venue, &first_rate)) = entries.next() else {
            return SpreadAnalysis::InsufficientData { venues_with_data: 0 };
        };
        let (mut short_venue, mut high_rate) = (first_venue, first_rate);
        let (mut long_venue, mut low_rate) = (first_venue, first_rate);
        for (&venue, &rate) in entries {
            if rate > high_rate {
                short_venue = venue;
                high_rate = rate;
            }
            if rate < low_rate {
                long_venue = venue;
                low_rate = rate;
            }
        }

        let gross_spread = high_rate - low_rate;
        let total_cost = self.cost_model.leg_cost(short_venue, InstrumentLeg::Futures)
            + self.cost_model.leg_cost(long_venue, InstrumentLeg::Futures);
        let net_spread = gross_spread - total_cost;

        debug!(
            "Spread {} ({}) vs {} ({}): gross {}, net {}",
            short_venue, high_rate, long_venue, low_rate, gross_spread, net_spread
        );

        SpreadAnalysis::Opportunity(SpreadOpportunity {
            short_venue,
            long_venue,
            high_rate,
            low_rate,
            gross_spread,
            total_cost,
            net_spread,
            is_profitable: net_spread > Decimal::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::cost::VenueCostSchedule;
    use std::collections::HashMap;

    fn flat_cost_model(futures_commission: &str) -> CostModel {
        let mut schedules = HashMap::new();
        for venue in Venue::all() {
            schedules.insert(
                venue,
                VenueCostSchedule {
                    commission_futures: futures_commission.parse().unwrap(),
                    commission_spot: Decimal::ZERO,
                    spread_cost: Decimal::ZERO,
                },
            );
        }
        CostModel::new(schedules).with_carry_cost(Decimal::ZERO)
    }

    fn snapshot(entries: &[(Venue, &str)]) -> BTreeMap<Venue, Decimal> {
        entries
            .iter()
            .map(|(venue, rate)| (*venue, rate.parse().unwrap()))
            .collect()
    }

    #[test]
    fn test_unprofitable_after_costs() {
        // Rates 0.03% / 0.01% / 0.02% with 0.02% cost per side:
        // net = 0.0002 - 0.0004 < 0
        let cost_model = flat_cost_model("0.0002");
        let analyzer = CrossExchangeSpreadAnalyzer::new(&cost_model);
        let rates = snapshot(&[
            (Venue::Binance, "0.0003"),
            (Venue::Bybit, "0.0001"),
            (Venue::Okx, "0.0002"),
        ]);

        match analyzer.analyze(&rates) {
            SpreadAnalysis::Opportunity(opportunity) => {
                assert_eq!(opportunity.short_venue, Venue::Binance);
                assert_eq!(opportunity.long_venue, Venue::Bybit);
                assert_eq!(opportunity.gross_spread, "0.0002".parse().unwrap());
                assert_eq!(opportunity.net_spread, "-0.0002".parse().unwrap());
                assert!(!opportunity.is_profitable);
            }
            other => panic!("Expected an opportunity, got {:?}", other),
        }
    }

    #[test]
    fn test_profitable_spread() {
        let cost_model = flat_cost_model("0.0001");
        let analyzer = CrossExchangeSpreadAnalyzer::new(&cost_model);
        let rates = snapshot(&[(Venue::Binance, "0.001"), (Venue::Okx, "-0.001")]);

        match analyzer.analyze(&rates) {
            SpreadAnalysis::Opportunity(opportunity) => {
                assert_eq!(opportunity.short_venue, Venue::Binance);
                assert_eq!(opportunity.long_venue, Venue::Okx);
                assert_eq!(opportunity.net_spread, "0.0018".parse().unwrap());
                assert!(opportunity.is_profitable);
            }
            other => panic!("Expected an opportunity, got {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_data() {
        let cost_model = flat_cost_model("0.0002");
        let analyzer = CrossExchangeSpreadAnalyzer::new(&cost_model);

        let empty = BTreeMap::new();
        assert!(matches!(
            analyzer.analyze(&empty),
            SpreadAnalysis::InsufficientData { venues_with_data: 0 }
        ));

        let one = snapshot(&[(Venue::Binance, "0.0003")]);
        assert!(matches!(
            analyzer.analyze(&one),
            SpreadAnalysis::InsufficientData { venues_with_data: 1 }
        ));
    }
}
