//! Domain events for the ledger.
//!
//! Each event is stored as its type tag plus a camelCase JSON object of its
//! fields. Every field is required on decode.

use rewind_core::error::DomainError;
use rewind_core::event::{Event, EventPayload, decode_payload, encode_payload};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tag of [`AccountCreated`].
pub const ACCOUNT_CREATED: &str = "AccountCreated";
/// Type tag of [`MoneyDeposited`].
pub const MONEY_DEPOSITED: &str = "MoneyDeposited";
/// Type tag of [`MoneyWithdrawn`].
pub const MONEY_WITHDRAWN: &str = "MoneyWithdrawn";
/// Type tag of [`AccountHolderChanged`].
pub const ACCOUNT_HOLDER_CHANGED: &str = "AccountHolderChanged";
/// Type tag of [`AccountClosed`].
pub const ACCOUNT_CLOSED: &str = "AccountClosed";

/// Every type tag the ledger can decode.
pub const TYPE_TAGS: [&str; 5] = [
    ACCOUNT_CREATED,
    MONEY_DEPOSITED,
    MONEY_WITHDRAWN,
    ACCOUNT_HOLDER_CHANGED,
    ACCOUNT_CLOSED,
];

/// Emitted when an account is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreated {
    /// The account identifier.
    pub account_id: Uuid,
    /// Name of the account holder.
    pub account_holder: String,
    /// Opening balance.
    pub initial_balance: Decimal,
    /// ISO currency code.
    pub currency: String,
}

/// Emitted when money is paid in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyDeposited {
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount deposited.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Balance once the deposit is applied.
    pub balance_after: Decimal,
}

/// Emitted when money is taken out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyWithdrawn {
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount withdrawn.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Balance once the withdrawal is applied.
    pub balance_after: Decimal,
}

/// Emitted when the account holder is renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolderChanged {
    /// The account identifier.
    pub account_id: Uuid,
    /// Holder name before the change.
    pub old_name: String,
    /// Holder name after the change.
    pub new_name: String,
}

/// Emitted when an account is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountClosed {
    /// The account identifier.
    pub account_id: Uuid,
    /// Why the account was closed.
    pub reason: String,
    /// Balance at the moment of closing.
    pub final_balance: Decimal,
}

/// Event payload variants for the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountEventKind {
    /// An account has been opened.
    AccountCreated(AccountCreated),
    /// Money has been deposited.
    MoneyDeposited(MoneyDeposited),
    /// Money has been withdrawn.
    MoneyWithdrawn(MoneyWithdrawn),
    /// The holder has been renamed.
    AccountHolderChanged(AccountHolderChanged),
    /// The account has been closed.
    AccountClosed(AccountClosed),
}

/// Domain event envelope for the ledger.
pub type AccountEvent = Event<AccountEventKind>;

impl EventPayload for AccountEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::AccountCreated(_) => ACCOUNT_CREATED,
            Self::MoneyDeposited(_) => MONEY_DEPOSITED,
            Self::MoneyWithdrawn(_) => MONEY_WITHDRAWN,
            Self::AccountHolderChanged(_) => ACCOUNT_HOLDER_CHANGED,
            Self::AccountClosed(_) => ACCOUNT_CLOSED,
        }
    }

    fn encode(&self) -> Result<serde_json::Value, DomainError> {
        match self {
            Self::AccountCreated(e) => encode_payload(e),
            Self::MoneyDeposited(e) => encode_payload(e),
            Self::MoneyWithdrawn(e) => encode_payload(e),
            Self::AccountHolderChanged(e) => encode_payload(e),
            Self::AccountClosed(e) => encode_payload(e),
        }
    }

    fn decode(event_type: &str, payload: serde_json::Value) -> Result<Self, DomainError> {
        match event_type {
            ACCOUNT_CREATED => Ok(Self::AccountCreated(decode_payload(event_type, payload)?)),
            MONEY_DEPOSITED => Ok(Self::MoneyDeposited(decode_payload(event_type, payload)?)),
            MONEY_WITHDRAWN => Ok(Self::MoneyWithdrawn(decode_payload(event_type, payload)?)),
            ACCOUNT_HOLDER_CHANGED => Ok(Self::AccountHolderChanged(decode_payload(
                event_type, payload,
            )?)),
            ACCOUNT_CLOSED => Ok(Self::AccountClosed(decode_payload(event_type, payload)?)),
            other => Err(DomainError::UnknownEventType(other.to_owned())),
        }
    }
}
