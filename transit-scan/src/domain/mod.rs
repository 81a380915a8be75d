//! Domain types for the connection scan planner.
//!
//! This module contains the read-only transit model: identifiers,
//! timestamps, connections, stops and trips. All types enforce their
//! invariants at construction time, so the scans can trust them.

mod connection;
mod error;
mod ids;
mod stop;
mod time;

pub use connection::{Connection, ConnectionMode};
pub use error::DomainError;
pub use ids::{ConnectionId, StopId, TripId};
pub use stop::{Attributes, Stop, Trip, haversine_m};
pub use time::{TimeError, Timestamp};
