//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::{Event, EventPayload};

/// Derived state of an event-sourced aggregate type.
///
/// `apply` is the only place state changes. It must read nothing but the
/// event, so that folding the same events from `Default` always yields the
/// same state.
pub trait Aggregate: Default + Clone + std::fmt::Debug + Send + Sync {
    /// The closed set of events this aggregate produces and consumes.
    type Payload: EventPayload;

    /// Stable name used to tag and filter stored entries by aggregate kind.
    const AGGREGATE_TYPE: &'static str;

    /// Returns the identity, or `None` before the creation event.
    fn aggregate_id(&self) -> Option<Uuid>;

    /// State transition: the state after `event`.
    #[must_use]
    fn apply(self, event: &Event<Self::Payload>) -> Self;
}

/// Version and uncommitted-event bookkeeping around an aggregate's state.
#[derive(Debug, Clone)]
pub struct AggregateRoot<A: Aggregate> {
    state: A,
    version: i64,
    uncommitted_events: Vec<Event<A::Payload>>,
}

impl<A: Aggregate> Default for AggregateRoot<A> {
    fn default() -> Self {
        Self {
            state: A::default(),
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }
}

impl<A: Aggregate> AggregateRoot<A> {
    /// Creates an empty, unborn aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstructs an aggregate by replaying `events` from version 1.
    #[must_use]
    pub fn from_history<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event<A::Payload>>,
        A::Payload: 'a,
    {
        let mut root = Self::new();
        root.load_from_history(events);
        root
    }

    /// Returns the aggregate identifier, or `None` while unborn.
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        self.state.aggregate_id()
    }

    /// Returns the derived state.
    #[must_use]
    pub fn state(&self) -> &A {
        &self.state
    }

    /// Returns the current version (number of events applied).
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the version the store held before the uncommitted events.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn base_version(&self) -> i64 {
        self.version - self.uncommitted_events.len() as i64
    }

    /// Runs the state transition for `event` and increments the version.
    pub fn apply(&mut self, event: &Event<A::Payload>) {
        self.state = std::mem::take(&mut self.state).apply(event);
        self.version += 1;
    }

    /// Applies a newly produced event and buffers it for persistence.
    pub fn raise(&mut self, event: Event<A::Payload>) {
        self.apply(&event);
        self.uncommitted_events.push(event);
    }

    /// Applies every event in order. The caller supplies the complete,
    /// version-ordered prefix.
    pub fn load_from_history<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a Event<A::Payload>>,
        A::Payload: 'a,
    {
        for event in events {
            self.apply(event);
        }
    }

    /// Returns uncommitted events produced by command handling.
    #[must_use]
    pub fn uncommitted_events(&self) -> &[Event<A::Payload>] {
        &self.uncommitted_events
    }

    /// Clears uncommitted events after persistence.
    pub fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
