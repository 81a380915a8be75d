//! Profiled connection scan.
//!
//! Scans connections backward over the whole query window and keeps, for
//! every stop, a Pareto frontier of journeys towards the destinations
//! rather than a single best one. A second set of frontiers per trip holds
//! the options of a traveller who stays aboard.

use std::collections::HashMap;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::domain::{Connection, StopId, Timestamp, TripId};
use crate::journey::{Comparator, Journey, Metric, ParetoFrontier};
use crate::store::{BatchCursor, DepartureIndex, Direction};
use crate::transfers::{Transfer, TransferGenerator};

use super::{ConnectionFilter, ScanError, ScanQuery, with_first_walk};

/// Backward multi-criteria scan producing every non-dominated journey.
///
/// The comparator must be monotone: if it prefers one journey over another
/// from a stop, it must still prefer it after both are extended by the same
/// connection. [`ProfileComparator`](crate::journey::ProfileComparator) is.
pub struct ProfiledConnectionScan<'a, M, C, T> {
    index: &'a DepartureIndex<'a>,
    comparator: C,
    transfers: T,
    filters: Vec<&'a dyn ConnectionFilter>,
    metric: PhantomData<fn() -> M>,
}

impl<'a, M, C, T> ProfiledConnectionScan<'a, M, C, T>
where
    M: Metric,
    C: Comparator<M>,
    T: TransferGenerator,
{
    pub fn new(index: &'a DepartureIndex<'a>, comparator: C, transfers: T) -> Self {
        Self {
            index,
            comparator,
            transfers,
            filters: Vec::new(),
            metric: PhantomData,
        }
    }

    /// Skip connections `filter` rejects.
    pub fn with_filter(mut self, filter: &'a dyn ConnectionFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Non-dominated journeys from each departure stop, keyed by stop.
    ///
    /// Stops with no journey in the window are left out. Journeys are built
    /// backward and include the walk from the traveller's origin.
    pub fn calculate(
        &self,
        query: &ScanQuery,
    ) -> Result<HashMap<StopId, Vec<Journey<M>>>, ScanError> {
        let stops = self.calculate_frontiers(query)?;

        let journeys = query
            .departure_walks()
            .into_iter()
            .filter_map(|(stop, walk)| {
                let frontier = stops.get(&stop)?;
                let earliest = query.earliest_departure + u64::from(walk);
                let journeys: Vec<Journey<M>> = frontier
                    .iter()
                    .filter(|j| j.time() >= earliest)
                    .map(|j| with_first_walk(j, walk))
                    .collect();
                (!journeys.is_empty()).then_some((stop, journeys))
            })
            .collect();
        Ok(journeys)
    }

    /// The frontier of every stop from which a destination can be reached.
    pub fn calculate_frontiers(
        &self,
        query: &ScanQuery,
    ) -> Result<HashMap<StopId, ParetoFrontier<M>>, ScanError> {
        query.validate()?;

        let mut search = Search {
            index: self.index,
            comparator: &self.comparator,
            transfers: &self.transfers,
            exits: exits(query, &self.transfers),
            latest_arrival: query.latest_arrival,
            stops: HashMap::new(),
            trips: HashMap::new(),
        };

        let mut cursor = BatchCursor::new(self.index, query.latest_arrival, Direction::Backward);
        let mut batch = Vec::new();
        let mut skipped = 0usize;
        loop {
            let Some(time) = cursor.peek_time() else {
                return Err(ScanError::InsufficientData {
                    bound: query.earliest_departure,
                });
            };
            if time < query.earliest_departure {
                break;
            }

            cursor.next_batch(&mut batch);
            for connection in &batch {
                if self.filters.iter().all(|f| f.may_use(connection)) {
                    search.scan(connection);
                } else {
                    skipped += 1;
                }
            }
            trace!(
                %time,
                connections = batch.len(),
                stops = search.stops.len(),
                "scanned batch"
            );

            if time <= query.earliest_departure {
                break;
            }
        }

        debug!(
            batches = cursor.batches_read(),
            skipped,
            stops = search.stops.len(),
            journeys = search.stops.values().map(ParetoFrontier::len).sum::<usize>(),
            "profile scan complete"
        );

        Ok(search.stops)
    }
}

/// Where a traveller can leave the network: every arrival stop, and every
/// stop within walking distance of one.
///
/// Maps a stop to `(arrival stop, footpath seconds, final walk seconds)`.
fn exits<T: TransferGenerator>(
    query: &ScanQuery,
    transfers: &T,
) -> HashMap<StopId, Vec<(StopId, u32, u32)>> {
    let mut exits: HashMap<StopId, Vec<(StopId, u32, u32)>> = HashMap::new();
    for (target, walk) in query.arrival_walks() {
        exits.entry(target).or_default().push((target, 0, walk));
        for (neighbour, secs) in transfers.neighbours(target) {
            exits
                .entry(neighbour)
                .or_default()
                .push((target, secs, walk));
        }
    }
    exits
}

struct Search<'s, M, C, T> {
    index: &'s DepartureIndex<'s>,
    comparator: &'s C,
    transfers: &'s T,
    exits: HashMap<StopId, Vec<(StopId, u32, u32)>>,
    latest_arrival: Timestamp,
    /// Journeys leaving each stop.
    stops: HashMap<StopId, ParetoFrontier<M>>,
    /// Journeys riding each trip from its earliest scanned connection.
    trips: HashMap<TripId, ParetoFrontier<M>>,
}

impl<M, C, T> Search<'_, M, C, T>
where
    M: Metric,
    C: Comparator<M>,
    T: TransferGenerator,
{
    fn scan(&mut self, c: &Connection) {
        if c.is_cancelled() {
            self.trips.remove(&c.trip());
            return;
        }

        let mut candidates: Vec<Journey<M>> = Vec::new();
        if let Some(trip) = self.trips.get(&c.trip()) {
            candidates.extend(
                trip.iter()
                    .filter(|j| j.location() == c.arrival_stop() && j.time() >= c.arrival_time())
                    .map(|j| j.chain_backward(c)),
            );
        }
        if c.can_alight() {
            candidates.extend(self.terminals(c));
            if let Some(onward) = self.stops.get(&c.arrival_stop()) {
                candidates.extend(onward.iter().filter_map(|j| self.alight_onto(c, j)));
            }
        }

        // Options from this connection replace those from later ones.
        let mut trip = ParetoFrontier::new();
        for candidate in candidates {
            if trip.add_to_frontier(candidate.clone(), self.comparator) && c.can_board() {
                self.offer_with_walks(candidate);
            }
        }
        if trip.is_empty() {
            self.trips.remove(&c.trip());
        } else {
            self.trips.insert(c.trip(), trip);
        }
    }

    /// Journeys ending by getting off `c` and walking to a destination.
    fn terminals(&self, c: &Connection) -> Vec<Journey<M>> {
        let stop = c.arrival_stop();
        let Some(exits) = self.exits.get(&stop) else {
            return Vec::new();
        };

        exits
            .iter()
            .filter_map(|&(target, footpath, walk)| {
                let arrival = c.arrival_time() + u64::from(footpath) + u64::from(walk);
                if arrival > self.latest_arrival {
                    return None;
                }
                let mut journey = Journey::genesis(target, arrival, Direction::Backward);
                if walk > 0 {
                    journey = journey.walk(&Transfer::ending_at(
                        target,
                        target,
                        arrival,
                        u64::from(walk),
                    ));
                }
                if footpath > 0 || target != stop {
                    journey = journey.walk(&Transfer::ending_at(
                        stop,
                        target,
                        journey.time(),
                        u64::from(footpath),
                    ));
                }
                Some(journey.chain_backward(c))
            })
            .collect()
    }

    /// `c` followed by the onward journey `j` from its arrival stop.
    fn alight_onto(&self, c: &Connection, j: &Journey<M>) -> Option<Journey<M>> {
        if j.trip() == Some(c.trip()) || j.time() < c.arrival_time() {
            return None;
        }

        if j.is_ride() {
            let departing = self.index.connection(j.connection()?)?;
            let transfer = self.transfers.generate_backward(c, departing)?;
            Some(j.transfer(&transfer).chain_backward(c))
        } else {
            Some(j.chain_backward(c))
        }
    }

    fn offer_with_walks(&mut self, journey: Journey<M>) {
        let (stop, time) = (journey.location(), journey.time());
        let kept = self
            .stops
            .entry(stop)
            .or_default()
            .add_to_frontier(journey.clone(), self.comparator);
        if !kept {
            return;
        }

        for (neighbour, secs) in self.transfers.neighbours(stop) {
            let walked = journey.walk(&Transfer::ending_at(neighbour, stop, time, u64::from(secs)));
            self.stops
                .entry(neighbour)
                .or_default()
                .add_to_frontier(walked, self.comparator);
        }
    }
}
