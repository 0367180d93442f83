//! Event repository abstraction.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainError;

/// An encoded event that has not been assigned a version yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Aggregate kind, used to enumerate instances.
    pub aggregate_type: String,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// 1-based position within the aggregate stream.
    pub version: i64,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
    /// Timestamp the store persisted the event.
    pub stored_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Builds the stored form of `pending` at `version`.
    #[must_use]
    pub fn from_pending(
        pending: &PendingEvent,
        aggregate_id: Uuid,
        aggregate_type: &str,
        version: i64,
        stored_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: pending.event_id,
            aggregate_id,
            aggregate_type: aggregate_type.to_owned(),
            event_type: pending.event_type.clone(),
            payload: pending.payload.clone(),
            version,
            occurred_at: pending.occurred_at,
            stored_at,
        }
    }
}

/// Repository trait for loading and appending domain events.
///
/// Version order is the only read order. Timestamps are informational.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all events for a given aggregate, ordered by version. Returns an
    /// empty vector when the aggregate has no events.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    ///
    /// `expected_version` is the last version the caller saw. Events receive
    /// versions `expected_version + 1 ..` in slice order. The whole batch is
    /// stored or none of it is. An empty batch succeeds without writing.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        expected_version: i64,
        events: &[PendingEvent],
    ) -> Result<Vec<StoredEvent>, DomainError>;

    /// Returns the distinct ids of all aggregates of `aggregate_type`.
    async fn list_aggregate_ids(&self, aggregate_type: &str)
    -> Result<BTreeSet<Uuid>, DomainError>;
}
