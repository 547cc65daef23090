pub mod data;

pub use data::types::{FundingObservation, RateSnapshot, Venue, VenueParseError};
