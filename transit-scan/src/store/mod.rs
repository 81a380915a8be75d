//! Connection store and departure index.
//!
//! Ingestion appends stops, trips and connections through a
//! [`TransitWriter`]; scans read immutable [`TransitSnapshot`]s through a
//! [`DepartureIndex`], which may merge several independently loaded
//! databases into one departure-ordered stream.

mod db;
mod departures;
mod error;
mod snapshot;

pub use db::{ConnectionInput, TransitDb, TransitWriter};
pub use departures::{BatchCursor, DepartureCursor, DepartureIndex, Direction};
pub use error::StoreError;
pub use snapshot::TransitSnapshot;
