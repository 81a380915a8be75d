//! Single-writer, multi-reader transit database.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::domain::{
    Attributes, Connection, ConnectionId, ConnectionMode, Stop, StopId, Timestamp, Trip, TripId,
};

use super::error::StoreError;
use super::snapshot::TransitSnapshot;

/// Everything needed to add a connection, minus its identifier.
#[derive(Debug, Clone)]
pub struct ConnectionInput {
    pub global_id: String,
    pub departure_stop: StopId,
    pub arrival_stop: StopId,
    pub departure_time: Timestamp,
    /// Travel time in seconds.
    pub travel_time: u32,
    pub trip: TripId,
    pub mode: ConnectionMode,
}

/// A transit database for one data source.
///
/// Readers call [`TransitDb::latest`] and keep the returned snapshot for the
/// duration of a scan. Writers go through [`TransitDb::update`], which has
/// exclusive access while it runs and publishes the result atomically.
///
/// # Examples
///
/// ```
/// use transit_scan::domain::{Attributes, ConnectionMode, Timestamp};
/// use transit_scan::store::{ConnectionInput, TransitDb};
///
/// let db = TransitDb::new(0);
/// db.update(|w| {
///     let a = w.add_or_update_stop("A", 51.0, 3.7, Attributes::new());
///     let b = w.add_or_update_stop("B", 51.1, 3.8, Attributes::new());
///     let trip = w.add_or_update_trip("T", None, Attributes::new());
///     w.add_or_update_connection(ConnectionInput {
///         global_id: "A-B".into(),
///         departure_stop: a,
///         arrival_stop: b,
///         departure_time: Timestamp::parse_utc("2024-03-15 16:20").unwrap(),
///         travel_time: 600,
///         trip,
///         mode: ConnectionMode::NORMAL,
///     })
/// })
/// .unwrap();
///
/// assert_eq!(db.latest().connection_count(), 1);
/// ```
#[derive(Debug)]
pub struct TransitDb {
    database_id: u32,
    latest: RwLock<Arc<TransitSnapshot>>,
    writer: Mutex<()>,
}

impl TransitDb {
    /// Create an empty database with the given id.
    pub fn new(database_id: u32) -> Self {
        Self {
            database_id,
            latest: RwLock::new(Arc::new(TransitSnapshot::empty(database_id))),
            writer: Mutex::new(()),
        }
    }

    pub fn database_id(&self) -> u32 {
        self.database_id
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<TransitSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run a writer and publish its changes.
    ///
    /// The writer starts from the latest snapshot. If `f` fails nothing is
    /// published and readers keep seeing the previous snapshot.
    pub fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut TransitWriter) -> Result<T, StoreError>,
    {
        let _exclusive = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut writer = TransitWriter {
            snapshot: (*self.latest()).clone(),
        };
        let result = f(&mut writer)?;

        let mut snapshot = writer.snapshot;
        snapshot.rebuild_departures();
        debug!(
            database_id = self.database_id,
            stops = snapshot.stop_count(),
            trips = snapshot.trip_count(),
            connections = snapshot.connection_count(),
            "published transit snapshot"
        );

        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        Ok(result)
    }
}

/// Exclusive write access to a [`TransitDb`] during [`TransitDb::update`].
///
/// Every global id maps to one local id forever: adding a record whose
/// global id is already known replaces its contents but keeps its id.
#[derive(Debug)]
pub struct TransitWriter {
    snapshot: TransitSnapshot,
}

impl TransitWriter {
    pub fn database_id(&self) -> u32 {
        self.snapshot.database_id
    }

    /// Add a stop, or update the stop with the same global id.
    pub fn add_or_update_stop(
        &mut self,
        global_id: &str,
        latitude: f64,
        longitude: f64,
        attributes: Attributes,
    ) -> StopId {
        let snapshot = &mut self.snapshot;
        let existing = snapshot.stops_by_global.get(global_id).copied();
        let local = existing.unwrap_or(snapshot.stops.len() as u32);
        let id = StopId::new(snapshot.database_id, local);
        let stop = Stop {
            id,
            global_id: global_id.to_string(),
            latitude,
            longitude,
            attributes,
        };

        match existing {
            Some(local) => snapshot.stops[local as usize] = stop,
            None => {
                snapshot.stops_by_global.insert(global_id.to_string(), local);
                snapshot.stops.push(stop);
            }
        }
        id
    }

    /// Add a trip, or update the trip with the same global id.
    pub fn add_or_update_trip(
        &mut self,
        global_id: &str,
        operator: Option<String>,
        attributes: Attributes,
    ) -> TripId {
        let snapshot = &mut self.snapshot;
        let id = match snapshot.trips_by_global.get(global_id) {
            Some(&local) => TripId::new(snapshot.database_id, local),
            None => {
                let local = snapshot.trips.len() as u32;
                snapshot.trips_by_global.insert(global_id.to_string(), local);
                let id = TripId::new(snapshot.database_id, local);
                snapshot.trips.push(Trip {
                    id,
                    global_id: global_id.to_string(),
                    operator: None,
                    attributes: Attributes::new(),
                });
                id
            }
        };

        let trip = &mut snapshot.trips[id.local_id() as usize];
        trip.operator = operator;
        trip.attributes = attributes;
        id
    }

    /// Add a connection, or update the connection with the same global id.
    ///
    /// Its stops and trip must already be present in this database.
    pub fn add_or_update_connection(
        &mut self,
        input: ConnectionInput,
    ) -> Result<ConnectionId, StoreError> {
        let snapshot = &mut self.snapshot;
        for stop in [input.departure_stop, input.arrival_stop] {
            if snapshot.stop(stop).is_none() {
                return Err(StoreError::UnknownStop(stop));
            }
        }
        if snapshot.trip(input.trip).is_none() {
            return Err(StoreError::UnknownTrip(input.trip));
        }

        let existing = snapshot.connections_by_global.get(&input.global_id).copied();
        let local = match existing {
            Some(local) => local,
            None => u32::try_from(snapshot.connections.len())
                .ok()
                .filter(|&l| l != u32::MAX)
                .ok_or(StoreError::Full(snapshot.database_id))?,
        };
        let id = ConnectionId::new(snapshot.database_id, local);

        let connection = Connection::new(
            id,
            input.global_id,
            input.departure_stop,
            input.arrival_stop,
            input.departure_time,
            input.travel_time,
            input.trip,
            input.mode,
        )?;

        match existing {
            Some(local) => snapshot.connections[local as usize] = connection,
            None => {
                snapshot
                    .connections_by_global
                    .insert(connection.global_id().to_string(), local);
                snapshot.connections.push(connection);
            }
        }
        Ok(id)
    }

    /// Mark an already loaded connection as cancelled.
    ///
    /// Returns false if no connection has this global id.
    pub fn cancel_connection(&mut self, global_id: &str) -> bool {
        let Some(&local) = self.snapshot.connections_by_global.get(global_id) else {
            return false;
        };
        let connection = &mut self.snapshot.connections[local as usize];
        *connection = connection.clone().with_mode(connection.mode().cancelled());
        true
    }

    /// Read access to the state being written.
    pub fn snapshot(&self) -> &TransitSnapshot {
        &self.snapshot
    }
}
