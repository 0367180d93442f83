//! Shared test mocks and utilities for Rewind.

mod clock;
mod repository;

pub use clock::{FixedClock, SteppingClock};
pub use repository::{
    AppendCall, EmptyEventRepository, FailingEventRepository, RecordingEventRepository,
};
