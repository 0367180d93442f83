//! Query handlers for the ledger.
//!
//! This module contains query handlers that replay account streams and
//! return read-only view DTOs, including views of past versions.

use chrono::{DateTime, Utc};
use rewind_core::aggregate::Aggregate;
use rewind_core::error::DomainError;
use rewind_core::event::EventPayload;
use rewind_core::projection::{RecordedEvent, StateSnapshot};
use rewind_core::repository::StoredEvent;
use rewind_core::store::EventStore;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::load_account;
use crate::application::errors::LedgerError;
use crate::domain::aggregates::AccountState;
use crate::domain::events::AccountEventKind;

/// Read-only view of an account's current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    /// The account identifier.
    pub id: Uuid,
    /// Current holder name.
    pub account_holder: String,
    /// Current balance.
    pub balance: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Whether the account is closed.
    pub is_closed: bool,
    /// When the account was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Current version (event count).
    pub version: i64,
}

impl AccountView {
    /// Builds the view of `state` at `version`.
    #[must_use]
    pub fn new(id: Uuid, state: &AccountState, version: i64) -> Self {
        Self {
            id,
            account_holder: state.account_holder.clone(),
            balance: state.balance,
            currency: state.currency.clone(),
            is_closed: state.is_closed,
            closed_at: state.closed_at,
            version,
        }
    }
}

/// An account as it was at one version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshotView {
    /// The version this snapshot reflects.
    pub version: i64,
    /// Holder name at that version.
    pub account_holder: String,
    /// Balance at that version.
    pub balance: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Whether the account was closed at that version.
    pub is_closed: bool,
}

impl From<&StateSnapshot<AccountState>> for AccountSnapshotView {
    fn from(snapshot: &StateSnapshot<AccountState>) -> Self {
        Self {
            version: snapshot.version,
            account_holder: snapshot.state.account_holder.clone(),
            balance: snapshot.state.balance,
            currency: snapshot.state.currency.clone(),
            is_closed: snapshot.state.is_closed,
        }
    }
}

/// One event in an account timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    /// The event identifier.
    pub event_id: Uuid,
    /// Type tag.
    pub event_type: String,
    /// Event fields as stored.
    pub event_data: serde_json::Value,
    /// Stream position.
    pub version: i64,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

impl TryFrom<&RecordedEvent<AccountEventKind>> for EventView {
    type Error = DomainError;

    fn try_from(recorded: &RecordedEvent<AccountEventKind>) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: recorded.event.event_id(),
            event_type: recorded.event.event_type().to_owned(),
            event_data: recorded.event.kind().encode()?,
            version: recorded.version,
            occurred_at: recorded.event.occurred_at(),
        })
    }
}

/// Current state, every event, and the state after each event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    /// The account as of its latest version.
    pub current_state: AccountView,
    /// Events in version order.
    pub events: Vec<EventView>,
    /// `state_history[k - 1]` is the account at version `k`.
    pub state_history: Vec<AccountSnapshotView>,
}

/// Retrieves an account by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID, or
/// a codec error from replay.
pub async fn get_account(
    account_id: Uuid,
    store: &EventStore,
) -> Result<AccountView, LedgerError> {
    let account = load_account(account_id, store).await?;
    Ok(AccountView::new(account_id, account.state(), account.version()))
}

/// Lists every account in identifier order.
///
/// # Errors
///
/// Returns a `DomainError` if enumerating ids or replaying any account fails.
pub async fn list_accounts(store: &EventStore) -> Result<Vec<AccountView>, LedgerError> {
    let ids = store.get_aggregate_ids(AccountState::AGGREGATE_TYPE).await?;
    let mut accounts = Vec::with_capacity(ids.len());
    for account_id in ids {
        accounts.push(get_account(account_id, store).await?);
    }
    Ok(accounts)
}

/// Returns the raw stored events of an account in version order.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
pub async fn get_account_events(
    account_id: Uuid,
    store: &EventStore,
) -> Result<Vec<StoredEvent>, LedgerError> {
    let events = store.get_events(account_id).await?;
    if events.is_empty() {
        return Err(DomainError::AggregateNotFound(account_id).into());
    }
    Ok(events)
}

/// Returns the full timeline of an account.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID, or
/// a codec error from replay.
pub async fn get_account_timeline(
    account_id: Uuid,
    store: &EventStore,
) -> Result<TimelineView, LedgerError> {
    let timeline = store.get_timeline::<AccountState>(account_id).await?;
    let events = timeline
        .events
        .iter()
        .map(EventView::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TimelineView {
        current_state: AccountView::new(
            account_id,
            timeline.current.state(),
            timeline.current.version(),
        ),
        events,
        state_history: timeline.history.iter().map(AccountSnapshotView::from).collect(),
    })
}

/// Returns the account as it was at `version`.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID and
/// `DomainError::InvalidVersion` if `version` is outside `1..=latest`.
pub async fn get_account_state_at_version(
    account_id: Uuid,
    version: i64,
    store: &EventStore,
) -> Result<AccountSnapshotView, LedgerError> {
    let snapshot = store
        .get_state_at_version::<AccountState>(account_id, version)
        .await?;
    Ok(AccountSnapshotView::from(&snapshot))
}
