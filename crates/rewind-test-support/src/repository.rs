//! Test repositories: mock `EventRepository` implementations for tests.

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rewind_core::error::DomainError;
use rewind_core::repository::{EventRepository, PendingEvent, StoredEvent};
use uuid::Uuid;

/// One recorded `append_events` call.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendCall {
    /// Target aggregate.
    pub aggregate_id: Uuid,
    /// Aggregate kind the events were tagged with.
    pub aggregate_type: String,
    /// Version the caller expected the stream to be at.
    pub expected_version: i64,
    /// The encoded events, in order.
    pub events: Vec<PendingEvent>,
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).unwrap()
}

/// An event repository that records all `append_events` calls. Returns the
/// configured stream from `load_events` on every call and always accepts
/// appends, numbering them after the caller's expected version.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Vec<StoredEvent>,
    appended: Mutex<Vec<AppendCall>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `load_events` call.
    #[must_use]
    pub fn new(load_result: Vec<StoredEvent>) -> Self {
        Self {
            load_result,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all append calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<AppendCall> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        expected_version: i64,
        events: &[PendingEvent],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        self.appended.lock().unwrap().push(AppendCall {
            aggregate_id,
            aggregate_type: aggregate_type.to_owned(),
            expected_version,
            events: events.to_vec(),
        });
        Ok(events
            .iter()
            .zip(expected_version + 1..)
            .map(|(event, version)| {
                StoredEvent::from_pending(event, aggregate_id, aggregate_type, version, epoch())
            })
            .collect())
    }

    async fn list_aggregate_ids(
        &self,
        aggregate_type: &str,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        Ok(self
            .load_result
            .iter()
            .filter(|e| e.aggregate_type == aggregate_type)
            .map(|e| e.aggregate_id)
            .collect())
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        expected_version: i64,
        events: &[PendingEvent],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(events
            .iter()
            .zip(expected_version + 1..)
            .map(|(event, version)| {
                StoredEvent::from_pending(event, aggregate_id, aggregate_type, version, epoch())
            })
            .collect())
    }

    async fn list_aggregate_ids(
        &self,
        _aggregate_type: &str,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        Ok(BTreeSet::new())
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _aggregate_type: &str,
        _expected_version: i64,
        _events: &[PendingEvent],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn list_aggregate_ids(
        &self,
        _aggregate_type: &str,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
