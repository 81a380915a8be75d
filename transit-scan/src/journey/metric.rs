//! Per-journey statistics.

use std::fmt;

use serde::Serialize;

use super::Link;

/// What a metric sees when a journey grows by one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub link: Link,
    /// Seconds between the previous point and the new one, waiting included.
    pub elapsed: u64,
    /// Seconds spent on the link itself, waiting excluded.
    pub duration: u64,
    /// True when this ride stays on the vehicle of the previous ride.
    pub continues_trip: bool,
}

/// A statistic accumulated along a journey.
///
/// Metrics are plain values: [`Metric::chain`] returns the statistic after
/// one more step and never mutates `self`.
pub trait Metric: Clone + fmt::Debug + Send + Sync + 'static {
    /// Value at a genesis point.
    fn zero() -> Self;

    /// Value after taking `step`.
    fn chain(&self, step: &Step) -> Self;
}

/// A metric that records nothing, for pure time queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct NoMetric;

impl Metric for NoMetric {
    fn zero() -> Self {
        NoMetric
    }

    fn chain(&self, _step: &Step) -> Self {
        NoMetric
    }
}

/// Travel time, vehicles boarded and time spent walking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TransferMetric {
    /// Seconds from the first point to the current one, waiting included.
    pub travel_time: u64,
    /// Number of distinct vehicles boarded.
    pub vehicles: u32,
    /// Seconds spent walking or changing between stops.
    pub walking_time: u64,
}

impl TransferMetric {
    /// Vehicle changes made so far.
    pub fn changes(&self) -> u32 {
        self.vehicles.saturating_sub(1)
    }
}

impl Metric for TransferMetric {
    fn zero() -> Self {
        Self::default()
    }

    fn chain(&self, step: &Step) -> Self {
        let mut next = *self;
        next.travel_time += step.elapsed;
        match step.link {
            Link::Ride { .. } if !step.continues_trip => next.vehicles += 1,
            Link::Transfer | Link::Walk => next.walking_time += step.duration,
            _ => {}
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, TripId};

    fn ride(continues_trip: bool) -> Step {
        Step {
            link: Link::Ride {
                connection: ConnectionId::new(0, 0),
                trip: TripId::new(0, 0),
            },
            elapsed: 600,
            duration: 500,
            continues_trip,
        }
    }

    #[test]
    fn boarding_counts_vehicle() {
        let m = TransferMetric::zero().chain(&ride(false));
        assert_eq!(m.vehicles, 1);
        assert_eq!(m.travel_time, 600);
        assert_eq!(m.walking_time, 0);
        assert_eq!(m.changes(), 0);
    }

    #[test]
    fn staying_aboard_is_free() {
        let m = TransferMetric::zero().chain(&ride(false)).chain(&ride(true));
        assert_eq!(m.vehicles, 1);
        assert_eq!(m.travel_time, 1_200);
    }

    #[test]
    fn walking_accumulates_duration_only() {
        let walk = Step {
            link: Link::Walk,
            elapsed: 400,
            duration: 300,
            continues_trip: false,
        };
        let m = TransferMetric::zero().chain(&walk);
        assert_eq!(m.walking_time, 300);
        assert_eq!(m.travel_time, 400);
        assert_eq!(m.vehicles, 0);
    }

    #[test]
    fn no_metric_is_inert() {
        assert_eq!(NoMetric::zero().chain(&ride(false)), NoMetric);
    }
}
