//! Store error types.

use crate::domain::{DomainError, StopId, TripId};

/// Errors raised when ingestion violates the store's contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The record itself is invalid
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A connection refers to a stop this database does not hold
    #[error("unknown stop {0}")]
    UnknownStop(StopId),

    /// A connection refers to a trip this database does not hold
    #[error("unknown trip {0}")]
    UnknownTrip(TripId),

    /// The database ran out of local ids
    #[error("database {0} is full")]
    Full(u32),
}
