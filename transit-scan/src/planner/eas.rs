//! Earliest arrival scan.
//!
//! Scans connections forward in time from the earliest departure, keeping
//! the best journey to every stop reached so far. Each connection either
//! extends the journey already riding its trip or is boarded from its
//! departure stop, whichever the comparator prefers.

use std::collections::HashMap;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::domain::{Connection, StopId, Timestamp, TripId};
use crate::journey::{Comparator, Dominance, Journey, Metric};
use crate::store::{BatchCursor, DepartureIndex, Direction};
use crate::transfers::{Transfer, TransferGenerator};

use super::{
    EarliestArrivalProfile, ProfileHorizon, ScanError, ScanQuery, has_rides, with_final_walk,
};

/// Result of [`EarliestConnectionScan::calculate_with_profile`].
#[derive(Debug, Clone)]
pub struct EarliestArrival<M> {
    /// The earliest arriving journey, if any arrives in time.
    pub journey: Option<Journey<M>>,
    /// What the scan learned about reachable stops and trips.
    pub profile: EarliestArrivalProfile,
}

/// Read access to the best arrivals of a running scan.
pub struct BestArrivals<'s, M> {
    best: &'s HashMap<StopId, Journey<M>>,
}

impl<M> BestArrivals<'_, M> {
    pub fn arrival(&self, stop: StopId) -> Option<Timestamp> {
        self.best.get(&stop).map(Journey::time)
    }

    pub fn journey(&self, stop: StopId) -> Option<&Journey<M>> {
        self.best.get(&stop)
    }

    /// Reached stops with their arrival times, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (StopId, Timestamp)> + '_ {
        self.best.iter().map(|(stop, j)| (*stop, j.time()))
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

/// Forward connection scan for the earliest arriving journey.
pub struct EarliestConnectionScan<'a, M, C, T> {
    index: &'a DepartureIndex<'a>,
    comparator: C,
    transfers: T,
    metric: PhantomData<fn() -> M>,
}

impl<'a, M, C, T> EarliestConnectionScan<'a, M, C, T>
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
            metric: PhantomData,
        }
    }

    /// The journey arriving earliest at any arrival stop, or `None` if no
    /// journey arrives by the query's latest arrival.
    pub fn calculate(&self, query: &ScanQuery) -> Result<Option<Journey<M>>, ScanError> {
        Ok(self.run(query, None, &mut |_, _| {})?.journey)
    }

    /// Like [`Self::calculate`], but keeps scanning up to the time returned
    /// by `horizon` to build a reachability profile.
    ///
    /// Scanning further never changes the journey.
    pub fn calculate_with_profile(
        &self,
        query: &ScanQuery,
        horizon: ProfileHorizon<'_, M>,
    ) -> Result<EarliestArrival<M>, ScanError> {
        self.run(query, Some(horizon), &mut |_, _| {})
    }

    /// Like [`Self::calculate`], calling `observer` after every batch.
    pub fn calculate_observed(
        &self,
        query: &ScanQuery,
        observer: &mut dyn FnMut(Timestamp, &BestArrivals<'_, M>),
    ) -> Result<Option<Journey<M>>, ScanError> {
        Ok(self.run(query, None, observer)?.journey)
    }

    fn run(
        &self,
        query: &ScanQuery,
        horizon: Option<ProfileHorizon<'_, M>>,
        observer: &mut dyn FnMut(Timestamp, &BestArrivals<'_, M>),
    ) -> Result<EarliestArrival<M>, ScanError> {
        query.validate()?;

        let targets = query.arrival_walks();
        let mut search = Search {
            index: self.index,
            comparator: &self.comparator,
            transfers: &self.transfers,
            best: HashMap::new(),
            trips: HashMap::new(),
        };
        let mut profile = horizon.map(|_| EarliestArrivalProfile::default());

        for (stop, walk) in query.departure_walks() {
            let mut origin = Journey::genesis(stop, query.earliest_departure, Direction::Forward);
            if walk > 0 {
                origin = origin.walk(&Transfer::new(
                    stop,
                    stop,
                    query.earliest_departure,
                    u64::from(walk),
                ));
            }
            if let Some(profile) = profile.as_mut() {
                profile.reach_with_walks(stop, origin.time(), &self.transfers);
            }
            search.improve_with_walks(origin);
        }

        let mut bound = query.latest_arrival;
        let mut found = search.best_target(&targets);
        if let Some((arrival, _)) = found {
            bound = bound.min(arrival);
        }

        let mut cursor = BatchCursor::new(self.index, query.earliest_departure, Direction::Forward);
        let mut batch = Vec::new();
        loop {
            let Some(time) = cursor.peek_time() else {
                return Err(ScanError::InsufficientData { bound });
            };
            if time > bound {
                break;
            }

            cursor.next_batch(&mut batch);
            for connection in &batch {
                search.scan(connection);
                if let Some(profile) = profile.as_mut() {
                    profile.relax(connection, &self.transfers);
                }
            }

            if let Some(target) = search.best_target(&targets) {
                bound = bound.min(target.0);
                found = Some(target);
            }
            trace!(
                %time,
                connections = batch.len(),
                reached = search.best.len(),
                %bound,
                "scanned batch"
            );
            observer(time, &BestArrivals { best: &search.best });

            // Later connections can't arrive before the bound.
            if time >= bound {
                break;
            }
        }

        let journey = found
            .filter(|(arrival, _)| *arrival <= query.latest_arrival)
            .and_then(|(_, stop)| {
                let journey = search.best.get(&stop)?;
                let walk = targets.get(&stop).copied().unwrap_or(0);
                Some(with_final_walk(journey, walk))
            });

        debug!(
            batches = cursor.batches_read(),
            reached = search.best.len(),
            arrival = ?journey.as_ref().map(Journey::arrival_time),
            "earliest arrival scan complete"
        );

        let profile = match (profile, horizon) {
            (Some(mut profile), Some(horizon)) => {
                let until = horizon(journey.as_ref());
                let scanned_until = extend_profile(
                    &mut profile,
                    &mut cursor,
                    &mut batch,
                    until,
                    &self.transfers,
                );
                profile.finish(scanned_until.max(bound));
                profile
            }
            _ => EarliestArrivalProfile::default(),
        };

        Ok(EarliestArrival { journey, profile })
    }
}

/// Keep relaxing the profile up to `until`.
///
/// Returns the time up to which every connection has been seen.
fn extend_profile<'a, T: TransferGenerator>(
    profile: &mut EarliestArrivalProfile,
    cursor: &mut BatchCursor<'a>,
    batch: &mut Vec<&'a Connection>,
    until: Timestamp,
    transfers: &T,
) -> Timestamp {
    loop {
        match cursor.peek_time() {
            None => return Timestamp::MAX,
            Some(time) if time > until => return until,
            Some(_) => {
                cursor.next_batch(batch);
                for connection in batch.iter() {
                    profile.relax(connection, transfers);
                }
            }
        }
    }
}

/// Mutable state of one scan.
struct Search<'s, M, C, T> {
    index: &'s DepartureIndex<'s>,
    comparator: &'s C,
    transfers: &'s T,
    /// Best journey to every reached stop.
    best: HashMap<StopId, Journey<M>>,
    /// Journey currently riding each trip.
    trips: HashMap<TripId, Journey<M>>,
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

        let stay = self
            .trips
            .get(&c.trip())
            .filter(|j| j.location() == c.departure_stop() && j.time() <= c.departure_time())
            .map(|j| j.chain_forward(c));
        let board = if c.can_board() { self.board(c) } else { None };

        let chosen = match (stay, board) {
            (Some(stay), Some(board)) => {
                if self.comparator.compare(&board, &stay) == Dominance::FirstBetter {
                    board
                } else {
                    stay
                }
            }
            (Some(journey), None) | (None, Some(journey)) => journey,
            (None, None) => return,
        };

        self.trips.insert(c.trip(), chosen.clone());
        if c.can_alight() {
            self.improve_with_walks(chosen);
        }
    }

    /// The journey boarding `c` from the best journey to its departure stop.
    fn board(&self, c: &Connection) -> Option<Journey<M>> {
        let base = self.best.get(&c.departure_stop())?;
        if base.time() > c.departure_time() || base.trip() == Some(c.trip()) {
            return None;
        }

        if base.is_ride() {
            let arriving = self.index.connection(base.connection()?)?;
            let transfer = self.transfers.generate(arriving, c)?;
            Some(base.transfer(&transfer).chain_forward(c))
        } else if has_rides(base) {
            Some(base.chain_forward(c))
        } else {
            // Still at the origin: leave just in time.
            Some(base.shifted(c.departure_time()).chain_forward(c))
        }
    }

    /// Replace the best journey to its stop if this one is better.
    fn improve(&mut self, journey: Journey<M>) -> bool {
        let better = match self.best.get(&journey.location()) {
            None => true,
            Some(known) => {
                journey.time() < known.time()
                    || (journey.time() == known.time()
                        && self.comparator.compare(&journey, known) == Dominance::FirstBetter)
            }
        };
        if better {
            self.best.insert(journey.location(), journey);
        }
        better
    }

    fn improve_with_walks(&mut self, journey: Journey<M>) {
        let (stop, time) = (journey.location(), journey.time());
        if !self.improve(journey.clone()) {
            return;
        }
        for (neighbour, secs) in self.transfers.neighbours(stop) {
            self.improve(journey.walk(&Transfer::new(stop, neighbour, time, u64::from(secs))));
        }
    }

    /// Earliest effective arrival over all arrival stops.
    fn best_target(&self, targets: &HashMap<StopId, u32>) -> Option<(Timestamp, StopId)> {
        targets
            .iter()
            .filter_map(|(stop, walk)| {
                let journey = self.best.get(stop)?;
                Some((journey.time() + u64::from(*walk), *stop))
            })
            .min()
    }
}
