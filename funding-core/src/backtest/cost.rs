// funding-core/src/backtest/cost.rs

use funding_common::Venue;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::Settings;

/// Instrument leg of the hedged position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentLeg {
    Futures,
    Spot,
}

/// Per-venue commission and spread estimates, as fractions of notional
#[derive(Debug, Clone)]
pub struct VenueCostSchedule {
    pub commission_futures: Decimal,
    pub commission_spot: Decimal,
    pub spread_cost: Decimal,
}

/// Transaction cost model for hedged funding positions.
///
/// One side of a round trip crosses both legs (futures + spot); a full
/// round trip is two sides, charged once on open and once on close against
/// the notional active at that moment.
#[derive(Debug, Clone)]
pub struct CostModel {
    schedules: HashMap<Venue, VenueCostSchedule>,
    carry_cost: Decimal,
    default_spread: Decimal,
}

impl CostModel {
    pub fn new(schedules: HashMap<Venue, VenueCostSchedule>) -> Self {
        Self {
            schedules,
            // Daily holding cost estimate, charged per leg
            carry_cost: Decimal::new(1, 4),
            // Spread assumed for venues without a configured schedule
            default_spread: Decimal::new(3, 4),
        }
    }

    /// Override the per-leg holding cost estimate
    pub fn with_carry_cost(mut self, carry_cost: Decimal) -> Self {
        self.carry_cost = carry_cost;
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, rust_decimal::Error> {
        let mut schedules = HashMap::new();
        for (name, costs) in &settings.venues {
            let venue: Venue = match name.parse() {
                Ok(venue) => venue,
                Err(_) => {
                    tracing::warn!("Ignoring cost schedule for unknown venue: {}", name);
                    continue;
                }
            };
            schedules.insert(
                venue,
                VenueCostSchedule {
                    commission_futures: Decimal::try_from(costs.commission_futures)?,
                    commission_spot: Decimal::try_from(costs.commission_spot)?,
                    spread_cost: Decimal::try_from(costs.spread_cost)?,
                },
            );
        }
        Ok(Self::new(schedules))
    }

    /// Cost of trading one leg on a venue: commission + spread + carry
    pub fn leg_cost(&self, venue: Venue, leg: InstrumentLeg) -> Decimal {
        let (commission, spread) = match self.schedules.get(&venue) {
            Some(schedule) => {
                let commission = match leg {
                    InstrumentLeg::Futures => schedule.commission_futures,
                    InstrumentLeg::Spot => schedule.commission_spot,
                };
                (commission, schedule.spread_cost)
            }
            None => (Decimal::ZERO, self.default_spread),
        };
        commission + spread + self.carry_cost
    }

    /// One side of a hedged round trip: futures leg plus spot leg
    pub fn hedged_side_cost(&self, venue: Venue) -> Decimal {
        self.leg_cost(venue, InstrumentLeg::Futures) + self.leg_cost(venue, InstrumentLeg::Spot)
    }

    /// Full round trip: entry side plus exit side
    pub fn round_trip_cost(&self, venue: Venue) -> Decimal {
        self.hedged_side_cost(venue) * Decimal::TWO
    }
}
