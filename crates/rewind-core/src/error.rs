//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No events exist for the aggregate.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// A time-travel request outside the stored range.
    #[error("invalid version {requested} for aggregate {aggregate_id}: valid range is 1 to {latest}")]
    InvalidVersion {
        /// The aggregate that was queried.
        aggregate_id: Uuid,
        /// The version that was requested.
        requested: i64,
        /// The latest stored version.
        latest: i64,
    },

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A stored event carries a type tag no registered shape matches.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// A stored payload could not be encoded or decoded.
    #[error("event deserialization failed: {0}")]
    Deserialization(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
