//! Journeys, metrics and Pareto frontiers.
//!
//! A [`Journey`] is a persistent singly linked list of points, newest first.
//! Extending a journey allocates one new point and shares the rest, so a
//! journey handed out by a scan is never altered by later scan steps.

mod compare;
mod frontier;
mod metric;
mod summary;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::domain::{Connection, ConnectionId, StopId, Timestamp, TripId};
use crate::store::Direction;
use crate::transfers::Transfer;

pub use compare::{Comparator, Dominance, ProfileComparator, TimeComparator, TransferComparator};
pub use frontier::ParetoFrontier;
pub use metric::{Metric, NoMetric, Step, TransferMetric};
pub use summary::{JourneySummary, LegKind, LegSummary};

/// How a point of a journey was reached from the previous point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
    /// First point of the journey.
    Genesis,
    /// Riding a connection.
    Ride {
        connection: ConnectionId,
        trip: TripId,
    },
    /// Changing vehicles, possibly between two nearby stops.
    Transfer,
    /// Walking to or from the journey's endpoints.
    Walk,
}

struct Point<M> {
    previous: Option<Journey<M>>,
    location: StopId,
    time: Timestamp,
    link: Link,
    /// Seconds spent on the link itself, waiting excluded.
    duration: u64,
    direction: Direction,
    metric: M,
}

/// An immutable journey, generic over the metric it accumulates.
///
/// Forward journeys start at their departure and grow towards their arrival;
/// backward journeys start at their arrival and grow towards their
/// departure. [`Journey::reversed`] turns the latter into the former.
///
/// Equality and hashing are structural over the whole chain of
/// `(location, time, link)` and ignore the metric.
pub struct Journey<M> {
    point: Arc<Point<M>>,
}

impl<M> Clone for Journey<M> {
    fn clone(&self) -> Self {
        Self {
            point: Arc::clone(&self.point),
        }
    }
}

impl<M: Metric> Journey<M> {
    /// A journey that has not moved yet.
    pub fn genesis(location: StopId, time: Timestamp, direction: Direction) -> Self {
        Self {
            point: Arc::new(Point {
                previous: None,
                location,
                time,
                link: Link::Genesis,
                duration: 0,
                direction,
                metric: M::zero(),
            }),
        }
    }

    /// The journey that never reaches anything.
    pub fn infinite() -> Self {
        Self::genesis(StopId::INVALID, Timestamp::MAX, Direction::Forward)
    }

    /// Extend a forward journey by riding `connection`.
    ///
    /// The connection must depart from this journey's location no earlier
    /// than its time.
    pub fn chain_forward(&self, connection: &Connection) -> Self {
        debug_assert_eq!(self.direction(), Direction::Forward);
        debug_assert_eq!(self.location(), connection.departure_stop());
        debug_assert!(connection.departure_time() >= self.time());
        self.extend(
            connection.arrival_stop(),
            connection.arrival_time(),
            Link::Ride {
                connection: connection.id(),
                trip: connection.trip(),
            },
            u64::from(connection.travel_time()),
        )
    }

    /// Extend a backward journey by riding `connection` in front of it.
    ///
    /// The connection must arrive at this journey's location no later than
    /// its time.
    pub fn chain_backward(&self, connection: &Connection) -> Self {
        debug_assert_eq!(self.direction(), Direction::Backward);
        debug_assert_eq!(self.location(), connection.arrival_stop());
        debug_assert!(connection.arrival_time() <= self.time());
        self.extend(
            connection.departure_stop(),
            connection.departure_time(),
            Link::Ride {
                connection: connection.id(),
                trip: connection.trip(),
            },
            u64::from(connection.travel_time()),
        )
    }

    /// Add an explicit change of vehicle.
    pub fn transfer(&self, transfer: &Transfer) -> Self {
        self.extend_with(transfer, Link::Transfer)
    }

    /// Add a walk to or from one of the journey's endpoints.
    pub fn walk(&self, walk: &Transfer) -> Self {
        self.extend_with(walk, Link::Walk)
    }

    fn extend_with(&self, transfer: &Transfer, link: Link) -> Self {
        match self.direction() {
            Direction::Forward => {
                debug_assert!(transfer.departure >= self.time());
                self.extend(transfer.to, transfer.arrival, link, transfer.duration())
            }
            Direction::Backward => {
                debug_assert!(transfer.arrival <= self.time());
                self.extend(transfer.from, transfer.departure, link, transfer.duration())
            }
        }
    }

    fn extend(&self, location: StopId, time: Timestamp, link: Link, duration: u64) -> Self {
        let step = Step {
            link,
            elapsed: time.abs_diff(self.time()),
            duration,
            continues_trip: matches!(
                (link, self.link()),
                (Link::Ride { trip: a, .. }, Link::Ride { trip: b, .. }) if a == b
            ),
        };
        let metric = self.metric().chain(&step);

        Self {
            point: Arc::new(Point {
                previous: Some(self.clone()),
                location,
                time,
                link,
                duration,
                direction: self.direction(),
                metric,
            }),
        }
    }

    /// Turn a backward journey into the equivalent forward journey.
    ///
    /// The metric is folded again from the new genesis. Forward journeys are
    /// returned unchanged.
    pub fn reversed(&self) -> Self {
        if self.direction() == Direction::Forward {
            return self.clone();
        }

        // Oldest point first: the arrival, ending with the departure.
        let points = self.points();
        let Some(departure) = points.last() else {
            return self.clone();
        };

        let mut journey = Self::genesis(departure.location(), departure.time(), Direction::Forward);
        for pair in points.windows(2).rev() {
            let (later, earlier) = (&pair[0], &pair[1]);
            let arrival = earlier.time() + earlier.point.duration;
            journey = journey.extend(
                later.location(),
                arrival,
                earlier.link(),
                earlier.point.duration,
            );
        }
        journey
    }

    /// The same journey moved in time so its current point is at `time`.
    ///
    /// Every point moves by the same amount. Only meaningful for journeys
    /// without rides, whose times are not pinned to a timetable.
    pub fn shifted(&self, time: Timestamp) -> Self {
        let later = time >= self.time();
        let delta = time.abs_diff(self.time());
        let shift = |t: Timestamp| if later { t + delta } else { t - delta };

        let points = self.points();
        let Some((root, rest)) = points.split_first() else {
            return self.clone();
        };

        let mut journey = Self::genesis(root.location(), shift(root.time()), self.direction());
        for point in rest {
            journey = journey.extend(
                point.location(),
                shift(point.time()),
                point.link(),
                point.link_duration(),
            );
        }
        journey
    }
}

impl<M> Journey<M> {
    pub fn location(&self) -> StopId {
        self.point.location
    }

    /// Time at the current point.
    pub fn time(&self) -> Timestamp {
        self.point.time
    }

    pub fn link(&self) -> Link {
        self.point.link
    }

    pub fn metric(&self) -> &M {
        &self.point.metric
    }

    pub fn direction(&self) -> Direction {
        self.point.direction
    }

    /// The journey up to the previous point, `None` at the genesis.
    pub fn previous(&self) -> Option<&Journey<M>> {
        self.point.previous.as_ref()
    }

    /// Seconds spent on the link to the current point.
    pub fn link_duration(&self) -> u64 {
        self.point.duration
    }

    pub fn is_genesis(&self) -> bool {
        self.point.previous.is_none()
    }

    pub fn is_infinite(&self) -> bool {
        self.is_genesis() && self.time() == Timestamp::MAX && !self.location().is_valid()
    }

    /// The first point of the journey.
    pub fn root(&self) -> &Journey<M> {
        let mut current = self;
        while let Some(previous) = current.previous() {
            current = previous;
        }
        current
    }

    /// Time at the genesis.
    pub fn start_time(&self) -> Timestamp {
        self.root().time()
    }

    /// Time the traveller leaves the first stop.
    pub fn departure_time(&self) -> Timestamp {
        match self.direction() {
            Direction::Forward => self.start_time(),
            Direction::Backward => self.time(),
        }
    }

    /// Time the traveller reaches the last stop.
    pub fn arrival_time(&self) -> Timestamp {
        match self.direction() {
            Direction::Forward => self.time(),
            Direction::Backward => self.start_time(),
        }
    }

    /// Seconds between departure and arrival.
    pub fn total_duration(&self) -> u64 {
        self.arrival_time().abs_diff(self.departure_time())
    }

    /// Trip ridden to reach the current point, if the last link was a ride.
    pub fn trip(&self) -> Option<TripId> {
        match self.link() {
            Link::Ride { trip, .. } => Some(trip),
            _ => None,
        }
    }

    /// Connection ridden to reach the current point, if the last link was
    /// a ride.
    pub fn connection(&self) -> Option<ConnectionId> {
        match self.link() {
            Link::Ride { connection, .. } => Some(connection),
            _ => None,
        }
    }

    /// Whether the current point was reached on a vehicle.
    pub fn is_ride(&self) -> bool {
        matches!(self.link(), Link::Ride { .. })
    }

    /// Points from the current one back to the genesis.
    pub fn iter(&self) -> Iter<'_, M> {
        Iter {
            current: Some(self),
        }
    }

    /// Points from the genesis up to the current one.
    pub fn points(&self) -> Vec<Journey<M>> {
        let mut points: Vec<Journey<M>> = self.iter().cloned().collect();
        points.reverse();
        points
    }

    /// Number of points, genesis included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Connections ridden, in the order they were chained.
    pub fn connections(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.iter().filter_map(Journey::connection).collect();
        ids.reverse();
        ids
    }

    fn key(&self) -> (StopId, Timestamp, Link) {
        (self.location(), self.time(), self.link())
    }
}

/// Iterator over the points of a journey, newest first.
pub struct Iter<'a, M> {
    current: Option<&'a Journey<M>>,
}

impl<'a, M> Iterator for Iter<'a, M> {
    type Item = &'a Journey<M>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = current.previous();
        Some(current)
    }
}

impl<M> PartialEq for Journey<M> {
    fn eq(&self, other: &Self) -> bool {
        let (mut a, mut b) = (Some(self), Some(other));
        loop {
            match (a, b) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if Arc::ptr_eq(&x.point, &y.point) {
                        return true;
                    }
                    if x.key() != y.key() {
                        return false;
                    }
                    a = x.previous();
                    b = y.previous();
                }
                _ => return false,
            }
        }
    }
}

impl<M> Eq for Journey<M> {}

impl<M> Hash for Journey<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for point in self.iter() {
            point.key().hash(state);
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for Journey<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points: Vec<_> = self
            .points()
            .iter()
            .map(|p| (p.location(), p.time(), p.link()))
            .collect();
        f.debug_struct("Journey")
            .field("direction", &self.direction())
            .field("metric", self.metric())
            .field("points", &points)
            .finish()
    }
}
