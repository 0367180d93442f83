//! Rewind Ledger: bank accounts as an event-sourced aggregate.
//!
//! Responsible for opening accounts, moving money, renaming holders and
//! closing accounts, and for reading any account back at any past version.

pub mod application {
    pub mod command_handlers;
    pub mod errors;
    pub mod query_handlers;
}

pub mod domain {
    pub mod aggregates;
    pub mod commands;
    pub mod errors;
    pub mod events;
}
