//! Route modules.

pub mod accounts;
pub mod health;
