//! Business rule violations raised by account operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Why an account operation was refused. A refused operation raises no event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// A required text argument was blank or a value was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A money amount was not positive or could not be represented.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A withdrawal exceeded the balance.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// The amount asked for.
        requested: Decimal,
        /// The balance at the time of the request.
        available: Decimal,
    },

    /// The account has no creation event yet.
    #[error("account has not been opened")]
    NotOpened,

    /// The account is closed and accepts no further changes.
    #[error("account is closed")]
    AccountClosed,

    /// The account was already closed.
    #[error("account is already closed")]
    AlreadyClosed,

    /// The new holder name equals the current one.
    #[error("new account holder name must differ from the current name")]
    NoChange,
}
