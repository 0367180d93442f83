//! Rewind event store adapters.
//!
//! Implementations of `rewind_core::repository::EventRepository`: a
//! `PostgreSQL` adapter for production and an in-memory adapter for tests and
//! local runs.

pub mod in_memory_event_repository;
pub mod pg_event_repository;
