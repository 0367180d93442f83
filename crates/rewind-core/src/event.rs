//! Domain event abstractions and the type-tagged event codec.

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DomainError;
use crate::repository::{PendingEvent, StoredEvent};

/// Sub-second digits kept on `occurred_at`, matching `TIMESTAMPTZ`.
const TIMESTAMP_PRECISION: u16 = 6;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// A closed set of event shapes belonging to one aggregate type.
///
/// Implemented by an enum with one variant per shape. `event_type` and
/// `decode` are the registry: both must list every variant, and an exhaustive
/// `match` keeps them in step with the enum.
pub trait EventPayload: Clone + std::fmt::Debug + Send + Sync + Sized {
    /// Returns the type tag used for storage routing and decode dispatch.
    fn event_type(&self) -> &'static str;

    /// Serializes the payload fields (without the tag) to JSON.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Deserialization` if the payload cannot be
    /// represented as JSON.
    fn encode(&self) -> Result<serde_json::Value, DomainError>;

    /// Rebuilds the payload for `event_type` from its JSON fields.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownEventType` for an unregistered tag and
    /// `DomainError::Deserialization` when a required field is missing or
    /// malformed.
    fn decode(event_type: &str, payload: serde_json::Value) -> Result<Self, DomainError>;
}

/// Serializes one concrete payload struct.
///
/// # Errors
///
/// Returns `DomainError::Deserialization` if serialization fails.
pub fn encode_payload<T: Serialize>(payload: &T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(payload).map_err(|e| DomainError::Deserialization(e.to_string()))
}

/// Deserializes one concrete payload struct, naming the tag in the error.
///
/// # Errors
///
/// Returns `DomainError::Deserialization` if a field is missing or malformed.
pub fn decode_payload<T: DeserializeOwned>(
    event_type: &str,
    payload: serde_json::Value,
) -> Result<T, DomainError> {
    serde_json::from_value(payload)
        .map_err(|e| DomainError::Deserialization(format!("{event_type}: {e}")))
}

/// An immutable domain event: metadata plus a typed payload.
///
/// Two events are equal when their ids are equal.
#[derive(Debug, Clone)]
pub struct Event<P> {
    metadata: EventMetadata,
    kind: P,
}

impl<P: EventPayload> Event<P> {
    /// Creates a new event with a fresh id, stamped with `clock`.
    ///
    /// The timestamp is truncated to microseconds so an event reads back from
    /// the log exactly as it was raised.
    #[must_use]
    pub fn new(kind: P, clock: &dyn Clock) -> Self {
        Self {
            metadata: EventMetadata {
                event_id: Uuid::now_v7(),
                occurred_at: clock.now().trunc_subsecs(TIMESTAMP_PRECISION),
            },
            kind,
        }
    }

    /// Reassembles an event from previously recorded parts.
    #[must_use]
    pub fn from_parts(metadata: EventMetadata, kind: P) -> Self {
        Self { metadata, kind }
    }

    /// Returns the event metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn event_id(&self) -> Uuid {
        self.metadata.event_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.metadata.occurred_at
    }

    /// Returns the type tag of the payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    /// Returns the typed payload.
    #[must_use]
    pub fn kind(&self) -> &P {
        &self.kind
    }

    /// Encodes the event into its not-yet-versioned storage form.
    ///
    /// # Errors
    ///
    /// Propagates payload encoding errors.
    pub fn to_pending(&self) -> Result<PendingEvent, DomainError> {
        Ok(PendingEvent {
            event_id: self.metadata.event_id,
            event_type: self.event_type().to_owned(),
            payload: self.kind.encode()?,
            occurred_at: self.metadata.occurred_at,
        })
    }

    /// Decodes a stored entry back into a typed event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownEventType` or
    /// `DomainError::Deserialization` from the payload codec.
    pub fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        let kind = P::decode(&stored.event_type, stored.payload.clone())?;
        Ok(Self::from_parts(
            EventMetadata {
                event_id: stored.event_id,
                occurred_at: stored.occurred_at,
            },
            kind,
        ))
    }
}

impl<P> PartialEq for Event<P> {
    fn eq(&self, other: &Self) -> bool {
        self.metadata.event_id == other.metadata.event_id
    }
}

impl<P> Eq for Event<P> {}
