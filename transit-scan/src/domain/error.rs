//! Domain error types.
//!
//! These errors represent records that violate the invariants of the
//! transit model. They are distinct from store and query errors.

/// Domain-level errors for validation of transit records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A connection was given the reserved "unset" departure time
    #[error("connection {0} has no departure time")]
    UnsetDeparture(String),

    /// Connection times are inconsistent
    #[error("invalid connection: {0}")]
    InvalidConnection(&'static str),
}
