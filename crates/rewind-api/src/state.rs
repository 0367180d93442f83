//! Shared application state.

use std::sync::Arc;

use rewind_core::clock::Clock;
use rewind_core::repository::EventRepository;
use rewind_core::store::EventStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock used to stamp new events.
    pub clock: Arc<dyn Clock>,
    /// Event store over the configured repository.
    pub store: EventStore,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, event_repository: Arc<dyn EventRepository>) -> Self {
        Self {
            clock,
            store: EventStore::new(event_repository),
        }
    }
}
