//! Immutable view of one transit database.

use std::collections::HashMap;

use crate::domain::{Connection, ConnectionId, Stop, StopId, Timestamp, Trip, TripId};

/// A consistent, read-only state of a [`TransitDb`](super::TransitDb).
///
/// Snapshots never change once published. Scans hold an `Arc` to one while
/// writers prepare the next.
#[derive(Debug, Clone, Default)]
pub struct TransitSnapshot {
    pub(super) database_id: u32,

    pub(super) stops: Vec<Stop>,
    pub(super) stops_by_global: HashMap<String, u32>,

    pub(super) trips: Vec<Trip>,
    pub(super) trips_by_global: HashMap<String, u32>,

    pub(super) connections: Vec<Connection>,
    pub(super) connections_by_global: HashMap<String, u32>,

    /// Local connection ids ordered by departure time. Connections of one
    /// trip sharing a departure time follow the trip; others keep local id
    /// order.
    pub(super) departures: Vec<u32>,
}

impl TransitSnapshot {
    /// An empty snapshot for the given database.
    pub fn empty(database_id: u32) -> Self {
        Self {
            database_id,
            ..Self::default()
        }
    }

    pub fn database_id(&self) -> u32 {
        self.database_id
    }

    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        if id.database_id() != self.database_id {
            return None;
        }
        self.stops.get(id.local_id() as usize)
    }

    pub fn stop_by_global_id(&self, global_id: &str) -> Option<&Stop> {
        self.stops_by_global
            .get(global_id)
            .and_then(|&i| self.stops.get(i as usize))
    }

    /// All stops, in local id order.
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter()
    }

    pub fn trip(&self, id: TripId) -> Option<&Trip> {
        if id.database_id() != self.database_id {
            return None;
        }
        self.trips.get(id.local_id() as usize)
    }

    pub fn trip_by_global_id(&self, global_id: &str) -> Option<&Trip> {
        self.trips_by_global
            .get(global_id)
            .and_then(|&i| self.trips.get(i as usize))
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        if id.database_id() != self.database_id {
            return None;
        }
        self.connections.get(id.local_id() as usize)
    }

    pub fn connection_by_global_id(&self, global_id: &str) -> Option<&Connection> {
        self.connections_by_global
            .get(global_id)
            .and_then(|&i| self.connections.get(i as usize))
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// Earliest and latest departure times held, if any connection is loaded.
    pub fn departure_range(&self) -> Option<(Timestamp, Timestamp)> {
        let first = self.departure_at(0)?;
        let last = self.departure_at(self.departures.len().checked_sub(1)?)?;
        Some((first.departure_time(), last.departure_time()))
    }

    /// Connection at a position of the departure order.
    pub(super) fn departure_at(&self, position: usize) -> Option<&Connection> {
        let local = *self.departures.get(position)?;
        self.connections.get(local as usize)
    }

    /// Number of connections departing strictly before `time`.
    pub(super) fn count_before(&self, time: Timestamp) -> usize {
        self.departures
            .partition_point(|&i| self.connections[i as usize].departure_time() < time)
    }

    /// Number of connections departing at or before `time`.
    pub(super) fn count_until(&self, time: Timestamp) -> usize {
        self.departures
            .partition_point(|&i| self.connections[i as usize].departure_time() <= time)
    }

    /// Re-sort the departure order after connections were added or changed.
    pub(super) fn rebuild_departures(&mut self) {
        let connections = &self.connections;
        let mut order: Vec<u32> = (0..connections.len() as u32).collect();
        order.sort_by_key(|&i| (connections[i as usize].departure_time(), i));

        let mut start = 0;
        while start < order.len() {
            let time = connections[order[start] as usize].departure_time();
            let len = order[start..]
                .iter()
                .take_while(|&&i| connections[i as usize].departure_time() == time)
                .count();
            if len > 1 {
                chain_trips(&mut order[start..start + len], connections);
            }
            start += len;
        }
        self.departures = order;
    }
}

/// Reorder the connections of each trip within one batch so that every one
/// departs from where the previous one arrived. Each trip keeps the slots
/// it already had.
fn chain_trips(batch: &mut [u32], connections: &[Connection]) {
    let mut slots: HashMap<TripId, Vec<usize>> = HashMap::new();
    for (slot, &i) in batch.iter().enumerate() {
        slots.entry(connections[i as usize].trip()).or_default().push(slot);
    }

    for trip_slots in slots.into_values().filter(|s| s.len() > 1) {
        let members: Vec<u32> = trip_slots.iter().map(|&slot| batch[slot]).collect();
        for (slot, i) in trip_slots.into_iter().zip(trip_order(members, connections)) {
            batch[slot] = i;
        }
    }
}

/// Connections of one trip in travel order.
///
/// Starts from a connection nothing else in the group arrives at, then
/// follows arrival stop to departure stop. Connections that don't link up
/// start a new chain in their original order.
fn trip_order(mut remaining: Vec<u32>, connections: &[Connection]) -> Vec<u32> {
    let conn = |i: u32| &connections[i as usize];
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let head = remaining
            .iter()
            .position(|&a| {
                !remaining
                    .iter()
                    .any(|&b| b != a && conn(b).arrival_stop() == conn(a).departure_stop())
            })
            .unwrap_or(0);
        let mut current = remaining.remove(head);
        ordered.push(current);

        loop {
            let Some(next) = remaining
                .iter()
                .position(|&b| conn(b).departure_stop() == conn(current).arrival_stop())
            else {
                break;
            };
            current = remaining.remove(next);
            ordered.push(current);
        }
    }
    ordered
}
