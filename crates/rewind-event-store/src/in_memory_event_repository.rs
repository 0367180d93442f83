//! In-memory implementation of the `EventRepository` trait.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use rewind_core::clock::Clock;
use rewind_core::error::DomainError;
use rewind_core::repository::{EventRepository, PendingEvent, StoredEvent};

/// Append-only event repository held in process memory.
///
/// Intended for tests and local runs. A batch is validated and appended under
/// a single write lock, so it is stored entirely or not at all.
pub struct InMemoryEventRepository {
    log: RwLock<Log>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Default)]
struct Log {
    streams: HashMap<Uuid, Vec<StoredEvent>>,
    /// Every stored event id, across all streams.
    event_ids: HashSet<Uuid>,
}

impl std::fmt::Debug for InMemoryEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventRepository")
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

impl InMemoryEventRepository {
    /// Creates an empty repository that stamps `stored_at` from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            log: RwLock::new(Log::default()),
            clock,
        }
    }
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::Infrastructure("event stream lock poisoned".to_owned())
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let log = self.log.read().map_err(poisoned)?;
        Ok(log.streams.get(&aggregate_id).cloned().unwrap_or_default())
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

        let mut log = self.log.write().map_err(poisoned)?;
        let actual = log
            .streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map_or(0, |last| last.version);

        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        let mut batch_ids = HashSet::with_capacity(events.len());
        for event in events {
            if log.event_ids.contains(&event.event_id) || !batch_ids.insert(event.event_id) {
                return Err(DomainError::Infrastructure(format!(
                    "duplicate event id {}",
                    event.event_id
                )));
            }
        }

        let stored_at = self.clock.now();
        let stored: Vec<StoredEvent> = events
            .iter()
            .zip(expected_version + 1..)
            .map(|(event, version)| {
                StoredEvent::from_pending(event, aggregate_id, aggregate_type, version, stored_at)
            })
            .collect();

        log.event_ids.extend(batch_ids);
        log.streams
            .entry(aggregate_id)
            .or_default()
            .extend(stored.iter().cloned());

        debug!(%aggregate_id, aggregate_type, count = stored.len(), "stored events in memory");
        Ok(stored)
    }

    async fn list_aggregate_ids(
        &self,
        aggregate_type: &str,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        let log = self.log.read().map_err(poisoned)?;
        Ok(log
            .streams
            .iter()
            .filter(|(_, stream)| {
                stream
                    .first()
                    .is_some_and(|first| first.aggregate_type == aggregate_type)
            })
            .map(|(id, _)| *id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use rewind_core::error::DomainError;
    use rewind_core::repository::{EventRepository, PendingEvent};
    use rewind_test_support::FixedClock;
    use uuid::Uuid;

    use super::InMemoryEventRepository;

    fn repository() -> InMemoryEventRepository {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        InMemoryEventRepository::new(Arc::new(clock))
    }

    fn pending(n: i64) -> PendingEvent {
        PendingEvent {
            event_id: Uuid::new_v4(),
            event_type: "TestEvent".to_owned(),
            payload: serde_json::json!({ "n": n }),
            occurred_at: Utc.with_ymd_and_hms(2026, 1, 14, 9, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_load_events_returns_empty_vec_for_nonexistent_aggregate() {
        // Act
        let events = repository().load_events(Uuid::new_v4()).await.unwrap();

        // Assert
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_append_assigns_versions_after_expected_version() {
        // Arrange
        let repo = repository();
        let aggregate_id = Uuid::new_v4();
        repo.append_events(aggregate_id, "Test", 0, &[pending(1), pending(2)])
            .await
            .unwrap();

        // Act
        let stored = repo
            .append_events(aggregate_id, "Test", 2, &[pending(3)])
            .await
            .unwrap();

        // Assert
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].version, 3);
        assert_eq!(
            stored[0].stored_at,
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        );
        let loaded = repo.load_events(aggregate_id).await.unwrap();
        let versions: Vec<i64> = loaded.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(loaded[2].payload, serde_json::json!({ "n": 3 }));
    }

    #[tokio::test]
    async fn test_stale_expected_version_rejects_whole_batch() {
        // Arrange
        let repo = repository();
        let aggregate_id = Uuid::new_v4();
        repo.append_events(aggregate_id, "Test", 0, &[pending(1), pending(2)])
            .await
            .unwrap();

        // Act
        let result = repo
            .append_events(aggregate_id, "Test", 0, &[pending(3), pending(4)])
            .await;

        // Assert
        match result {
            Err(DomainError::ConcurrencyConflict {
                aggregate_id: conflict_agg_id,
                expected,
                actual,
            }) => {
                assert_eq!(conflict_agg_id, aggregate_id);
                assert_eq!(expected, 0);
                assert_eq!(actual, 2);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
        assert_eq!(repo.load_events(aggregate_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_failing_on_second_event_stores_nothing() {
        // Arrange
        let repo = repository();
        let existing = pending(1);
        repo.append_events(Uuid::new_v4(), "Test", 0, std::slice::from_ref(&existing))
            .await
            .unwrap();
        let target = Uuid::new_v4();
        let mut reused = pending(2);
        reused.event_id = existing.event_id;

        // Act
        let result = repo
            .append_events(target, "Test", 0, &[pending(1), reused])
            .await;

        // Assert
        match result {
            Err(DomainError::Infrastructure(msg)) => {
                assert!(msg.contains(&existing.event_id.to_string()));
            }
            other => panic!("expected Infrastructure, got {other:?}"),
        }
        assert!(repo.load_events(target).await.unwrap().is_empty());
        assert!(!repo.list_aggregate_ids("Test").await.unwrap().contains(&target));
    }

    #[tokio::test]
    async fn test_duplicate_event_id_within_batch_is_rejected() {
        // Arrange
        let repo = repository();
        let aggregate_id = Uuid::new_v4();
        let event = pending(1);

        // Act
        let result = repo
            .append_events(aggregate_id, "Test", 0, &[event.clone(), event])
            .await;

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert!(repo.load_events(aggregate_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_empty_events_is_noop() {
        // Arrange
        let repo = repository();
        let aggregate_id = Uuid::new_v4();

        // Act
        let stored = repo
            .append_events(aggregate_id, "Test", 0, &[])
            .await
            .unwrap();

        // Assert
        assert!(stored.is_empty());
        assert!(repo.load_events(aggregate_id).await.unwrap().is_empty());
        assert!(repo.list_aggregate_ids("Test").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_aggregate_ids_is_distinct_and_filtered_by_type() {
        // Arrange
        let repo = repository();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let other = Uuid::new_v4();
        repo.append_events(a, "Test", 0, &[pending(1), pending(2)])
            .await
            .unwrap();
        repo.append_events(b, "Test", 0, &[pending(1)]).await.unwrap();
        repo.append_events(other, "Other", 0, &[pending(1)])
            .await
            .unwrap();

        // Act
        let ids = repo.list_aggregate_ids("Test").await.unwrap();

        // Assert
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
    }
}
