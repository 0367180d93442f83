//! Counter aggregate and in-process doubles shared by this crate's tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::clock::Clock;
use crate::error::DomainError;
use crate::event::{Event, EventPayload, decode_payload, encode_payload};
use crate::repository::{EventRepository, PendingEvent, StoredEvent};

pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(crate) fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Started {
    pub counter_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Incremented {
    pub by: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CounterEventKind {
    Started(Started),
    Incremented(Incremented),
}

impl EventPayload for CounterEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Started(_) => "Started",
            Self::Incremented(_) => "Incremented",
        }
    }

    fn encode(&self) -> Result<serde_json::Value, DomainError> {
        match self {
            Self::Started(p) => encode_payload(p),
            Self::Incremented(p) => encode_payload(p),
        }
    }

    fn decode(event_type: &str, payload: serde_json::Value) -> Result<Self, DomainError> {
        match event_type {
            "Started" => Ok(Self::Started(decode_payload(event_type, payload)?)),
            "Incremented" => Ok(Self::Incremented(decode_payload(event_type, payload)?)),
            other => Err(DomainError::UnknownEventType(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Counter {
    pub id: Option<Uuid>,
    pub total: u32,
}

impl Aggregate for Counter {
    type Payload = CounterEventKind;
    const AGGREGATE_TYPE: &'static str = "Counter";

    fn aggregate_id(&self) -> Option<Uuid> {
        self.id
    }

    fn apply(mut self, event: &Event<Self::Payload>) -> Self {
        match event.kind() {
            CounterEventKind::Started(p) => self.id = Some(p.counter_id),
            CounterEventKind::Incremented(p) => self.total += p.by,
        }
        self
    }
}

pub(crate) fn started(clock: &dyn Clock, counter_id: Uuid) -> Event<CounterEventKind> {
    Event::new(CounterEventKind::Started(Started { counter_id }), clock)
}

pub(crate) fn incremented(clock: &dyn Clock, by: u32) -> Event<CounterEventKind> {
    Event::new(CounterEventKind::Incremented(Incremented { by }), clock)
}

/// Stores `events` as versions `1..=N` of `counter_id`.
pub(crate) fn stored_stream(
    counter_id: Uuid,
    events: &[Event<CounterEventKind>],
) -> Vec<StoredEvent> {
    events
        .iter()
        .zip(1..)
        .map(|(event, version)| {
            StoredEvent::from_pending(
                &event.to_pending().unwrap(),
                counter_id,
                Counter::AGGREGATE_TYPE,
                version,
                event.occurred_at(),
            )
        })
        .collect()
}

/// Minimal map-backed repository with the same version rules as the real
/// adapters.
#[derive(Debug, Default)]
pub(crate) struct MemoryRepository {
    streams: Mutex<HashMap<Uuid, Vec<StoredEvent>>>,
}

#[async_trait]
impl EventRepository for MemoryRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .streams
            .lock()
            .unwrap()
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        aggregate_type: &str,
        expected_version: i64,
        events: &[PendingEvent],
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(aggregate_id).or_default();
        let actual = stream.last().map_or(0, |e| e.version);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }
        let stored: Vec<StoredEvent> = events
            .iter()
            .zip(expected_version + 1..)
            .map(|(e, v)| StoredEvent::from_pending(e, aggregate_id, aggregate_type, v, e.occurred_at))
            .collect();
        stream.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn list_aggregate_ids(
        &self,
        aggregate_type: &str,
    ) -> Result<BTreeSet<Uuid>, DomainError> {
        Ok(self
            .streams
            .lock()
            .unwrap()
            .values()
            .flatten()
            .filter(|e| e.aggregate_type == aggregate_type)
            .map(|e| e.aggregate_id)
            .collect())
    }
}
