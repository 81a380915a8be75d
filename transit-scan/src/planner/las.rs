//! Latest departure scan.
//!
//! The mirror image of the earliest arrival scan: connections are scanned
//! backward from the latest arrival, and every stop keeps the journey that
//! leaves it as late as possible while still reaching a destination.
//! Journeys are built backward; use [`Journey::reversed`] for travel order.

use std::collections::HashMap;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::domain::{Connection, StopId, Timestamp, TripId};
use crate::journey::{Comparator, Dominance, Journey, Metric};
use crate::store::{BatchCursor, DepartureIndex, Direction};
use crate::transfers::{Transfer, TransferGenerator};

use super::{
    LatestDepartureProfile, ProfileHorizon, ScanError, ScanQuery, has_rides, with_first_walk,
};

/// Result of [`LatestConnectionScan::calculate_with_profile`].
#[derive(Debug, Clone)]
pub struct LatestDeparture<M> {
    /// The latest departing journey, if any leaves in time.
    pub journey: Option<Journey<M>>,
    /// What the scan learned about stops that lead to a destination.
    pub profile: LatestDepartureProfile,
}

/// Backward connection scan for the latest departing journey.
pub struct LatestConnectionScan<'a, M, C, T> {
    index: &'a DepartureIndex<'a>,
    comparator: C,
    transfers: T,
    metric: PhantomData<fn() -> M>,
}

impl<'a, M, C, T> LatestConnectionScan<'a, M, C, T>
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

    /// The journey leaving any departure stop as late as possible, or
    /// `None` if no journey leaves after the query's earliest departure.
    pub fn calculate(&self, query: &ScanQuery) -> Result<Option<Journey<M>>, ScanError> {
        Ok(self.run(query, None)?.journey)
    }

    /// Like [`Self::calculate`], but keeps scanning back to the time
    /// returned by `horizon` to build a reachability profile.
    pub fn calculate_with_profile(
        &self,
        query: &ScanQuery,
        horizon: ProfileHorizon<'_, M>,
    ) -> Result<LatestDeparture<M>, ScanError> {
        self.run(query, Some(horizon))
    }

    fn run(
        &self,
        query: &ScanQuery,
        horizon: Option<ProfileHorizon<'_, M>>,
    ) -> Result<LatestDeparture<M>, ScanError> {
        query.validate()?;

        let origins = query.departure_walks();
        let targets = query.arrival_walks();
        let mut search = Search {
            index: self.index,
            comparator: &self.comparator,
            transfers: &self.transfers,
            best: HashMap::new(),
            trips: HashMap::new(),
        };
        let mut profile = horizon.map(|_| LatestDepartureProfile::default());

        for (&stop, &walk) in &targets {
            let mut destination = Journey::genesis(stop, query.latest_arrival, Direction::Backward);
            if walk > 0 {
                destination = destination.walk(&Transfer::ending_at(
                    stop,
                    stop,
                    query.latest_arrival,
                    u64::from(walk),
                ));
            }
            if let Some(profile) = profile.as_mut() {
                profile.reach_with_walks(stop, destination.time(), &self.transfers);
            }
            search.improve_with_walks(destination);
        }

        let mut bound = query.earliest_departure;
        let mut found = search.best_origin(&origins);
        if let Some((departure, _)) = found {
            bound = bound.max(departure);
        }

        let mut cursor = BatchCursor::new(self.index, query.latest_arrival, Direction::Backward);
        let mut batch = Vec::new();
        loop {
            let Some(time) = cursor.peek_time() else {
                return Err(ScanError::InsufficientData { bound });
            };
            if time < bound {
                break;
            }

            cursor.next_batch(&mut batch);
            for connection in &batch {
                search.scan(connection);
                if let Some(profile) = profile.as_mut() {
                    profile.relax(connection, &self.transfers);
                }
            }

            if let Some(origin) = search.best_origin(&origins) {
                bound = bound.max(origin.0);
                found = Some(origin);
            }
            trace!(
                %time,
                connections = batch.len(),
                reached = search.best.len(),
                %bound,
                "scanned batch"
            );

            // Earlier connections can't leave after the bound.
            if time <= bound {
                break;
            }
        }

        let journey = found
            .filter(|(departure, _)| *departure >= query.earliest_departure)
            .and_then(|(_, stop)| {
                let journey = search.best.get(&stop)?;
                let walk = origins.get(&stop).copied().unwrap_or(0);
                Some(with_first_walk(journey, walk))
            });

        debug!(
            batches = cursor.batches_read(),
            reached = search.best.len(),
            departure = ?journey.as_ref().map(Journey::departure_time),
            "latest departure scan complete"
        );

        let profile = match (profile, horizon) {
            (Some(mut profile), Some(horizon)) => {
                let from = horizon(journey.as_ref());
                let scanned_from =
                    extend_profile(&mut profile, &mut cursor, &mut batch, from, &self.transfers);
                profile.finish(scanned_from.min(bound));
                profile
            }
            _ => LatestDepartureProfile::default(),
        };

        Ok(LatestDeparture { journey, profile })
    }
}

/// Keep relaxing the profile back to `from`.
///
/// Returns the time from which every connection has been seen.
fn extend_profile<'a, T: TransferGenerator>(
    profile: &mut LatestDepartureProfile,
    cursor: &mut BatchCursor<'a>,
    batch: &mut Vec<&'a Connection>,
    from: Timestamp,
    transfers: &T,
) -> Timestamp {
    loop {
        match cursor.peek_time() {
            None => return Timestamp::UNSET,
            Some(time) if time < from => return from,
            Some(_) => {
                cursor.next_batch(batch);
                for connection in batch.iter() {
                    profile.relax(connection, transfers);
                }
            }
        }
    }
}

struct Search<'s, M, C, T> {
    index: &'s DepartureIndex<'s>,
    comparator: &'s C,
    transfers: &'s T,
    /// Latest departing journey from every stop that leads somewhere.
    best: HashMap<StopId, Journey<M>>,
    /// Journey starting with the earliest scanned connection of each trip.
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
            .filter(|j| j.location() == c.arrival_stop() && j.time() >= c.arrival_time())
            .map(|j| j.chain_backward(c));
        let alight = if c.can_alight() { self.alight(c) } else { None };

        let chosen = match (stay, alight) {
            (Some(stay), Some(alight)) => {
                if self.comparator.compare(&alight, &stay) == Dominance::FirstBetter {
                    alight
                } else {
                    stay
                }
            }
            (Some(journey), None) | (None, Some(journey)) => journey,
            (None, None) => return,
        };

        self.trips.insert(c.trip(), chosen.clone());
        if c.can_board() {
            self.improve_with_walks(chosen);
        }
    }

    /// The journey alighting from `c` onto the best journey from its
    /// arrival stop.
    fn alight(&self, c: &Connection) -> Option<Journey<M>> {
        let base = self.best.get(&c.arrival_stop())?;
        if base.time() < c.arrival_time() || base.trip() == Some(c.trip()) {
            return None;
        }

        if base.is_ride() {
            let departing = self.index.connection(base.connection()?)?;
            let transfer = self.transfers.generate_backward(c, departing)?;
            Some(base.transfer(&transfer).chain_backward(c))
        } else if has_rides(base) {
            Some(base.chain_backward(c))
        } else {
            // Already at the destination: arrive as soon as possible.
            Some(base.shifted(c.arrival_time()).chain_backward(c))
        }
    }

    fn improve(&mut self, journey: Journey<M>) -> bool {
        let better = match self.best.get(&journey.location()) {
            None => true,
            Some(known) => {
                journey.time() > known.time()
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
            self.improve(journey.walk(&Transfer::ending_at(neighbour, stop, time, u64::from(secs))));
        }
    }

    /// Latest effective departure over all departure stops.
    fn best_origin(&self, origins: &HashMap<StopId, u32>) -> Option<(Timestamp, StopId)> {
        origins
            .iter()
            .filter_map(|(stop, walk)| {
                let journey = self.best.get(stop)?;
                Some((journey.time() - u64::from(*walk), *stop))
            })
            .max()
    }
}
