//! Connection scan journey planning.
//!
//! Three scans over the departure index answer different questions:
//!
//! - [`EarliestConnectionScan`] walks forward in time and finds the journey
//!   that arrives first.
//! - [`LatestConnectionScan`] walks backward and finds the journey that
//!   leaves last.
//! - [`ProfiledConnectionScan`] walks backward over a whole window and keeps
//!   every non-dominated journey per stop.
//!
//! [`Calculator`] chains them: the two single-criterion scans bound the
//! window and build the profiles that let the profile scan skip
//! connections no journey can use.

mod calculator;
mod config;
mod eas;
mod filter;
mod las;
mod pcs;
mod query;
mod rank;


pub use calculator::Calculator;
pub use config::{ConfigError, ScanConfig};
pub use eas::{BestArrivals, EarliestArrival, EarliestConnectionScan};
pub use filter::{ConnectionFilter, EarliestArrivalProfile, LatestDepartureProfile};
pub use las::{LatestConnectionScan, LatestDeparture};
pub use pcs::ProfiledConnectionScan;
pub use query::{Endpoint, ScanError, ScanQuery};
pub use rank::{deduplicate, rank_journeys, remove_dominated};

use crate::domain::Timestamp;
use crate::journey::{Journey, Metric};
use crate::transfers::Transfer;

/// Given the journey a scan found, if any, how far its profile should reach.
pub type ProfileHorizon<'h, M> = &'h dyn Fn(Option<&Journey<M>>) -> Timestamp;

pub(crate) fn has_rides<M>(journey: &Journey<M>) -> bool {
    journey.iter().any(Journey::is_ride)
}

/// Append the walk from the last stop to the traveller's destination.
pub(crate) fn with_final_walk<M: Metric>(journey: &Journey<M>, walk: u32) -> Journey<M> {
    if walk == 0 {
        return journey.clone();
    }
    let stop = journey.location();
    journey.walk(&Transfer::new(stop, stop, journey.time(), u64::from(walk)))
}

/// Prepend the walk from the traveller's origin to a backward journey.
pub(crate) fn with_first_walk<M: Metric>(journey: &Journey<M>, walk: u32) -> Journey<M> {
    if walk == 0 {
        return journey.clone();
    }
    let stop = journey.location();
    journey.walk(&Transfer::ending_at(stop, stop, journey.time(), u64::from(walk)))
}
