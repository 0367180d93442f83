//! Event store facade: typed append, replay and projections over an
//! [`EventRepository`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateRoot};
use crate::error::DomainError;
use crate::event::{Event, EventPayload};
use crate::projection::{self, StateSnapshot, Timeline};
use crate::repository::{EventRepository, StoredEvent};

/// Shared handle to the event log.
#[derive(Clone)]
pub struct EventStore {
    repository: Arc<dyn EventRepository>,
}

impl fmt::Debug for EventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStore").finish_non_exhaustive()
    }
}

impl EventStore {
    /// Creates a store backed by `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    /// Encodes `events` and appends them after `base_version`.
    ///
    /// # Errors
    ///
    /// Propagates codec errors and repository errors, including
    /// `DomainError::ConcurrencyConflict` when the stream has moved past
    /// `base_version`.
    pub async fn append<P: EventPayload>(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        events: &[Event<P>],
        base_version: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let pending = events
            .iter()
            .map(Event::to_pending)
            .collect::<Result<Vec<_>, _>>()?;
        let stored = self
            .repository
            .append_events(aggregate_id, aggregate_type, base_version, &pending)
            .await?;
        debug!(
            %aggregate_id,
            aggregate_type,
            from_version = base_version + 1,
            count = stored.len(),
            "appended events"
        );
        Ok(stored)
    }

    /// Loads and decodes every event of an aggregate in version order.
    /// Returns an empty vector when the aggregate has no events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownEventType` or
    /// `DomainError::Deserialization` if any entry cannot be decoded.
    pub async fn load<P: EventPayload>(&self, aggregate_id: Uuid) -> Result<Vec<Event<P>>, DomainError> {
        self.repository
            .load_events(aggregate_id)
            .await?
            .iter()
            .map(Event::from_stored)
            .collect()
    }

    /// Persists the uncommitted events of `root` and clears its buffer.
    /// Does nothing when there are none.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the aggregate has no identity, or
    /// any error from [`EventStore::append`]. The buffer is kept on error.
    pub async fn save<A: Aggregate>(
        &self,
        root: &mut AggregateRoot<A>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        if root.uncommitted_events().is_empty() {
            return Ok(Vec::new());
        }
        let aggregate_id = root.id().ok_or_else(|| {
            DomainError::Validation(format!(
                "cannot save a {} that has no identity",
                A::AGGREGATE_TYPE
            ))
        })?;
        let stored = self
            .append(
                aggregate_id,
                A::AGGREGATE_TYPE,
                root.uncommitted_events(),
                root.base_version(),
            )
            .await?;
        root.clear_uncommitted_events();
        Ok(stored)
    }

    /// Rebuilds an aggregate from its complete stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if no events exist, or a
    /// codec error from replay.
    pub async fn get_aggregate<A: Aggregate>(
        &self,
        aggregate_id: Uuid,
    ) -> Result<AggregateRoot<A>, DomainError> {
        let stored = self.get_events(aggregate_id).await?;
        if stored.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        projection::replay::<A, _>(&stored, |_, _| {})
    }

    /// Returns the undecoded stream of an aggregate in version order.
    ///
    /// # Errors
    ///
    /// Propagates repository errors.
    pub async fn get_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.repository.load_events(aggregate_id).await
    }

    /// Returns the ids of every aggregate of `aggregate_type`.
    ///
    /// # Errors
    ///
    /// Propagates repository errors.
    pub async fn get_aggregate_ids(
        &self,
        aggregate_type: &str,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        self.repository.list_aggregate_ids(aggregate_type).await
    }

    /// Returns current state, decoded events and per-version history.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if no events exist, or a
    /// codec error from replay.
    pub async fn get_timeline<A: Aggregate>(
        &self,
        aggregate_id: Uuid,
    ) -> Result<Timeline<A>, DomainError> {
        let stored = self.get_events(aggregate_id).await?;
        if stored.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        projection::build_timeline(&stored)
    }

    /// Returns the state of an aggregate as of `version`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if no events exist,
    /// `DomainError::InvalidVersion` if `version` is out of range, or a codec
    /// error from replay.
    pub async fn get_state_at_version<A: Aggregate>(
        &self,
        aggregate_id: Uuid,
        version: i64,
    ) -> Result<StateSnapshot<A>, DomainError> {
        let stored = self.get_events(aggregate_id).await?;
        projection::state_at_version(aggregate_id, &stored, version)
    }
}
