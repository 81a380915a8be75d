//! Reachability profiles used to prune profile scans.
//!
//! Both profiles are relaxed scans: they ignore change times and metrics,
//! so they only ever over-approximate which connections can be used. A
//! connection they reject can't be part of any journey in the window.

use std::collections::HashMap;

use crate::domain::{Connection, StopId, Timestamp, TripId};
use crate::transfers::TransferGenerator;

/// Decides whether a scan needs to look at a connection at all.
pub trait ConnectionFilter {
    fn may_use(&self, connection: &Connection) -> bool;
}

impl<F: ConnectionFilter + ?Sized> ConnectionFilter for &F {
    fn may_use(&self, connection: &Connection) -> bool {
        (**self).may_use(connection)
    }
}

/// Earliest time each stop and trip can be reached from the origins.
///
/// Built by the earliest arrival scan. Connections departing after the
/// scanned range are always allowed.
#[derive(Debug, Clone)]
pub struct EarliestArrivalProfile {
    arrivals: HashMap<StopId, Timestamp>,
    /// Departure of the first usable connection of each trip.
    trips: HashMap<TripId, Timestamp>,
    scanned_until: Timestamp,
}

impl Default for EarliestArrivalProfile {
    fn default() -> Self {
        Self {
            arrivals: HashMap::new(),
            trips: HashMap::new(),
            scanned_until: Timestamp::UNSET,
        }
    }
}

impl EarliestArrivalProfile {
    /// Earliest arrival at `stop`, if it was reached.
    pub fn arrival(&self, stop: StopId) -> Option<Timestamp> {
        self.arrivals.get(&stop).copied()
    }

    /// Departure of the first connection of `trip` that could be ridden.
    pub fn trip_reached(&self, trip: TripId) -> Option<Timestamp> {
        self.trips.get(&trip).copied()
    }

    /// Every connection departing at or before this time has been seen.
    pub fn scanned_until(&self) -> Timestamp {
        self.scanned_until
    }

    pub fn reached_stops(&self) -> usize {
        self.arrivals.len()
    }

    /// Record that `stop` can be reached at `time`. Returns true if that
    /// is an improvement.
    pub(crate) fn reach(&mut self, stop: StopId, time: Timestamp) -> bool {
        match self.arrivals.get(&stop) {
            Some(known) if *known <= time => false,
            _ => {
                self.arrivals.insert(stop, time);
                true
            }
        }
    }

    /// Reach `stop` at `time` and walk on to its neighbours.
    pub(crate) fn reach_with_walks<T>(&mut self, stop: StopId, time: Timestamp, transfers: &T)
    where
        T: TransferGenerator + ?Sized,
    {
        if self.reach(stop, time) {
            for (neighbour, secs) in transfers.neighbours(stop) {
                self.reach(neighbour, time + u64::from(secs));
            }
        }
    }

    /// Scan one connection. Connections must arrive in departure order.
    pub(crate) fn relax<T>(&mut self, connection: &Connection, transfers: &T)
    where
        T: TransferGenerator + ?Sized,
    {
        if connection.is_cancelled() || !self.usable(connection) {
            return;
        }
        self.trips
            .entry(connection.trip())
            .or_insert(connection.departure_time());
        if connection.can_alight() {
            self.reach_with_walks(connection.arrival_stop(), connection.arrival_time(), transfers);
        }
    }

    pub(crate) fn finish(&mut self, scanned_until: Timestamp) {
        self.scanned_until = scanned_until;
    }

    fn usable(&self, c: &Connection) -> bool {
        let on_trip = self
            .trip_reached(c.trip())
            .is_some_and(|t| t <= c.departure_time());
        let boardable = c.can_board()
            && self
                .arrival(c.departure_stop())
                .is_some_and(|t| t <= c.departure_time());
        on_trip || boardable
    }
}

impl ConnectionFilter for EarliestArrivalProfile {
    fn may_use(&self, connection: &Connection) -> bool {
        connection.departure_time() > self.scanned_until || self.usable(connection)
    }
}

/// Latest time each stop can be left while still reaching a destination.
///
/// Built by the latest departure scan. Connections departing before the
/// scanned range are always allowed.
#[derive(Debug, Clone)]
pub struct LatestDepartureProfile {
    departures: HashMap<StopId, Timestamp>,
    /// Departure of the last usable connection of each trip.
    trips: HashMap<TripId, Timestamp>,
    scanned_from: Timestamp,
}

impl Default for LatestDepartureProfile {
    fn default() -> Self {
        Self {
            departures: HashMap::new(),
            trips: HashMap::new(),
            scanned_from: Timestamp::MAX,
        }
    }
}

impl LatestDepartureProfile {
    /// Latest time to leave `stop`, if a destination can be reached from it.
    pub fn departure(&self, stop: StopId) -> Option<Timestamp> {
        self.departures.get(&stop).copied()
    }

    /// Departure of the last connection of `trip` that leads somewhere.
    pub fn trip_reached(&self, trip: TripId) -> Option<Timestamp> {
        self.trips.get(&trip).copied()
    }

    /// Every connection departing at or after this time has been seen.
    pub fn scanned_from(&self) -> Timestamp {
        self.scanned_from
    }

    pub(crate) fn reach(&mut self, stop: StopId, time: Timestamp) -> bool {
        match self.departures.get(&stop) {
            Some(known) if *known >= time => false,
            _ => {
                self.departures.insert(stop, time);
                true
            }
        }
    }

    pub(crate) fn reach_with_walks<T>(&mut self, stop: StopId, time: Timestamp, transfers: &T)
    where
        T: TransferGenerator + ?Sized,
    {
        if self.reach(stop, time) {
            for (neighbour, secs) in transfers.neighbours(stop) {
                self.reach(neighbour, time - u64::from(secs));
            }
        }
    }

    /// Scan one connection. Connections must arrive in reverse departure order.
    pub(crate) fn relax<T>(&mut self, connection: &Connection, transfers: &T)
    where
        T: TransferGenerator + ?Sized,
    {
        if connection.is_cancelled() || !self.usable(connection) {
            return;
        }
        self.trips
            .entry(connection.trip())
            .or_insert(connection.departure_time());
        if connection.can_board() {
            self.reach_with_walks(
                connection.departure_stop(),
                connection.departure_time(),
                transfers,
            );
        }
    }

    pub(crate) fn finish(&mut self, scanned_from: Timestamp) {
        self.scanned_from = scanned_from;
    }

    fn usable(&self, c: &Connection) -> bool {
        let on_trip = self
            .trip_reached(c.trip())
            .is_some_and(|t| t >= c.arrival_time());
        let alightable = c.can_alight()
            && self
                .departure(c.arrival_stop())
                .is_some_and(|t| t >= c.arrival_time());
        on_trip || alightable
    }
}

impl ConnectionFilter for LatestDepartureProfile {
    fn may_use(&self, connection: &Connection) -> bool {
        connection.departure_time() < self.scanned_from || self.usable(connection)
    }
}
