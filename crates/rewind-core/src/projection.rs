//! Replay-based projections: per-version history, timeline and time travel.
//!
//! Every projection starts from a fresh, empty aggregate and applies stored
//! events one at a time in version order. Nothing here reads the clock.

use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateRoot};
use crate::error::DomainError;
use crate::event::Event;
use crate::repository::StoredEvent;

/// Derived state as of one version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot<A> {
    /// Number of events applied to reach this state.
    pub version: i64,
    /// The derived state.
    pub state: A,
}

/// A decoded event together with its position in the stream.
#[derive(Debug, Clone)]
pub struct RecordedEvent<P> {
    /// 1-based stream position.
    pub version: i64,
    /// The decoded event.
    pub event: Event<P>,
}

/// Current state, every decoded event and the state after each one.
#[derive(Debug, Clone)]
pub struct Timeline<A: Aggregate> {
    /// The aggregate after all events.
    pub current: AggregateRoot<A>,
    /// Decoded events in version order.
    pub events: Vec<RecordedEvent<A::Payload>>,
    /// `history[k - 1]` is the state at version `k`.
    pub history: Vec<StateSnapshot<A>>,
}

/// Folds `stored` into a fresh aggregate, calling `visit` after each event.
///
/// # Errors
///
/// Returns a codec error for an undecodable entry, or
/// `DomainError::Infrastructure` if the stream's versions are not `1..N`.
pub fn replay<A, F>(stored: &[StoredEvent], mut visit: F) -> Result<AggregateRoot<A>, DomainError>
where
    A: Aggregate,
    F: FnMut(&AggregateRoot<A>, Event<A::Payload>),
{
    let mut root = AggregateRoot::<A>::new();
    for entry in stored {
        let event = Event::<A::Payload>::from_stored(entry)?;
        root.apply(&event);
        if entry.version != root.version() {
            return Err(DomainError::Infrastructure(format!(
                "stream for aggregate {} is not contiguous: expected version {}, found {}",
                entry.aggregate_id,
                root.version(),
                entry.version
            )));
        }
        visit(&root, event);
    }
    Ok(root)
}

/// Returns the state after every event of `stored`.
///
/// # Errors
///
/// See [`replay`].
pub fn build_history<A: Aggregate>(
    stored: &[StoredEvent],
) -> Result<Vec<StateSnapshot<A>>, DomainError> {
    let mut history = Vec::with_capacity(stored.len());
    replay::<A, _>(stored, |root, _| history.push(snapshot(root)))?;
    Ok(history)
}

/// Builds the full timeline of a stream in a single replay.
///
/// # Errors
///
/// See [`replay`].
pub fn build_timeline<A: Aggregate>(stored: &[StoredEvent]) -> Result<Timeline<A>, DomainError> {
    let mut events = Vec::with_capacity(stored.len());
    let mut history = Vec::with_capacity(stored.len());
    let current = replay::<A, _>(stored, |root, event| {
        events.push(RecordedEvent {
            version: root.version(),
            event,
        });
        history.push(snapshot(root));
    })?;
    Ok(Timeline {
        current,
        events,
        history,
    })
}

/// Returns the state at exactly `version` by replaying only that prefix.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if `stored` is empty and
/// `DomainError::InvalidVersion` if `version` is outside `1..=stored.len()`.
pub fn state_at_version<A: Aggregate>(
    aggregate_id: Uuid,
    stored: &[StoredEvent],
    version: i64,
) -> Result<StateSnapshot<A>, DomainError> {
    if stored.is_empty() {
        return Err(DomainError::AggregateNotFound(aggregate_id));
    }
    #[allow(clippy::cast_possible_wrap)]
    let latest = stored.len() as i64;
    let prefix_len = usize::try_from(version)
        .ok()
        .filter(|len| (1..=stored.len()).contains(len))
        .ok_or(DomainError::InvalidVersion {
            aggregate_id,
            requested: version,
            latest,
        })?;
    let root = replay::<A, _>(&stored[..prefix_len], |_, _| {})?;
    Ok(snapshot(&root))
}

fn snapshot<A: Aggregate>(root: &AggregateRoot<A>) -> StateSnapshot<A> {
    StateSnapshot {
        version: root.version(),
        state: root.state().clone(),
    }
}
