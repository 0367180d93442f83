//! Errors returned by ledger command and query handlers.

use rewind_core::error::DomainError;
use thiserror::Error;

use crate::domain::errors::AccountError;

/// A refused account operation or a failure of the event store.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The account rejected the operation.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Loading, replaying or persisting events failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
