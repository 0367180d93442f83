//! `PostgreSQL` implementation of the `EventRepository` trait.
//!
//! Events live in the `event_store` table (see `migrations/`). A batch is
//! appended inside one transaction: the current maximum version is read and
//! compared with the caller's expected version, then every row is inserted.
//! Dropping the future before commit rolls the transaction back, so a batch
//! is never partially visible.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use rewind_core::error::DomainError;
use rewind_core::repository::{EventRepository, PendingEvent, StoredEvent};

/// Unique constraint on `(aggregate_id, version)`.
const VERSION_CONSTRAINT: &str = "event_store_aggregate_version_key";

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0)::BIGINT FROM event_store WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&self.pool)
        .await
        .map_err(infrastructure)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    aggregate_id: Uuid,
    aggregate_type: String,
    event_type: String,
    event_data: serde_json::Value,
    version: i64,
    occurred_at: DateTime<Utc>,
    stored_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.id,
            aggregate_id: row.aggregate_id,
            aggregate_type: row.aggregate_type,
            event_type: row.event_type,
            payload: row.event_data,
            version: row.version,
            occurred_at: row.occurred_at,
            stored_at: row.stored_at,
        }
    }
}

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

/// True when another writer already holds one of the versions being inserted.
/// Other unique violations, such as a reused event id, are not conflicts.
fn is_version_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(VERSION_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    #[instrument(skip(self), err)]
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r"
            SELECT id, aggregate_id, aggregate_type, event_type, event_data,
                   version, occurred_at, stored_at
            FROM event_store
            WHERE aggregate_id = $1
            ORDER BY version ASC
            ",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    #[instrument(skip(self, events), fields(event_count = events.len()), err)]
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

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0)::BIGINT FROM event_store WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(infrastructure)?;

        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        let mut stored = Vec::with_capacity(events.len());
        for (event, version) in events.iter().zip(expected_version + 1..) {
            let inserted: Result<DateTime<Utc>, sqlx::Error> = sqlx::query_scalar(
                r"
                INSERT INTO event_store
                    (id, aggregate_id, aggregate_type, event_type, event_data, version, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING stored_at
                ",
            )
            .bind(event.event_id)
            .bind(aggregate_id)
            .bind(aggregate_type)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(version)
            .bind(event.occurred_at)
            .fetch_one(&mut *tx)
            .await;

            let stored_at = match inserted {
                Ok(stored_at) => stored_at,
                Err(err) if is_version_conflict(&err) => {
                    // A concurrent writer committed between our version read
                    // and this insert.
                    drop(tx);
                    let actual = self.current_version(aggregate_id).await?;
                    return Err(DomainError::ConcurrencyConflict {
                        aggregate_id,
                        expected: expected_version,
                        actual,
                    });
                }
                Err(err) => return Err(infrastructure(err)),
            };

            stored.push(StoredEvent::from_pending(
                event,
                aggregate_id,
                aggregate_type,
                version,
                stored_at,
            ));
        }

        tx.commit().await.map_err(infrastructure)?;

        for event in &stored {
            info!(
                event_type = %event.event_type,
                %aggregate_id,
                aggregate_type,
                version = event.version,
                "stored event"
            );
        }

        Ok(stored)
    }

    #[instrument(skip(self), err)]
    async fn list_aggregate_ids(
        &self,
        aggregate_type: &str,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT DISTINCT aggregate_id FROM event_store WHERE aggregate_type = $1")
                .bind(aggregate_type)
                .fetch_all(&self.pool)
                .await
                .map_err(infrastructure)?;

        Ok(ids.into_iter().collect())
    }
}
