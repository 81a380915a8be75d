//! Flat, serializable view of a journey for callers.

use serde::Serialize;

use crate::domain::{ConnectionId, StopId, Timestamp, TripId};

use super::{Journey, Link, Metric};

/// What a leg of a summarized journey is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Ride,
    Transfer,
    Walk,
}

/// One leg of a journey summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegSummary {
    pub kind: LegKind,

    /// Stop the leg starts from
    pub from: StopId,

    /// Stop the leg ends at
    pub to: StopId,

    /// Time the leg starts
    pub departure: Timestamp,

    /// Time the leg ends
    pub arrival: Timestamp,

    /// Connection ridden, for rides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionId>,

    /// Trip ridden, for rides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripId>,
}

/// A journey flattened into legs in travel order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JourneySummary<M> {
    pub departure: Timestamp,
    pub arrival: Timestamp,
    pub legs: Vec<LegSummary>,
    pub metric: M,
}

impl<M: Metric> JourneySummary<M> {
    /// Summarize a journey, reversing it first if it was built backward.
    pub fn new(journey: &Journey<M>) -> Self {
        let forward = journey.reversed();
        let points = forward.points();

        let legs = points
            .windows(2)
            .filter_map(|pair| {
                let (from, to) = (&pair[0], &pair[1]);
                let (kind, connection, trip) = match to.link() {
                    Link::Genesis => return None,
                    Link::Ride { connection, trip } => {
                        (LegKind::Ride, Some(connection), Some(trip))
                    }
                    Link::Transfer => (LegKind::Transfer, None, None),
                    Link::Walk => (LegKind::Walk, None, None),
                };
                Some(LegSummary {
                    kind,
                    from: from.location(),
                    to: to.location(),
                    departure: to.time() - to.link_duration(),
                    arrival: to.time(),
                    connection,
                    trip,
                })
            })
            .collect();

        Self {
            departure: forward.departure_time(),
            arrival: forward.arrival_time(),
            legs,
            metric: forward.metric().clone(),
        }
    }
}
