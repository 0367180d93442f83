//! Rewind Core: event-sourced aggregates and the event store contract.
//!
//! State is never stored directly: every aggregate is the fold of its event
//! log. This crate defines the aggregate bookkeeping, the type-tagged event
//! codec, the storage boundary and the replay-based projections. It contains
//! no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod event;
pub mod projection;
pub mod repository;
pub mod store;

#[cfg(test)]
mod test_fixtures;
