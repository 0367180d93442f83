//! Command handlers for the ledger.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use rewind_core::clock::Clock;
use rewind_core::store::EventStore;
use tracing::debug;
use uuid::Uuid;

use crate::application::errors::LedgerError;
use crate::application::query_handlers::AccountView;
use crate::domain::aggregates::{AccountState, BankAccount};
use crate::domain::commands::{ChangeAccountHolder, CloseAccount, Deposit, OpenAccount, Withdraw};

/// Reconstitutes a `BankAccount` from its full stream.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the account has no events, or
/// a codec error from replay.
pub(crate) async fn load_account(
    account_id: Uuid,
    store: &EventStore,
) -> Result<BankAccount, LedgerError> {
    let root = store.get_aggregate::<AccountState>(account_id).await?;
    Ok(BankAccount::from(root))
}

async fn persist(
    account_id: Uuid,
    mut account: BankAccount,
    store: &EventStore,
) -> Result<AccountView, LedgerError> {
    let stored = store.save(account.root_mut()).await?;
    debug!(%account_id, version = account.version(), events = stored.len(), "account saved");
    Ok(AccountView::new(account_id, account.state(), account.version()))
}

/// Handles the `OpenAccount` command: creates a fresh aggregate, raises
/// `AccountCreated`, and persists it.
///
/// # Errors
///
/// Returns `AccountError::InvalidArgument` for a blank holder or negative
/// balance, or a `DomainError` if appending fails.
pub async fn handle_open_account(
    command: &OpenAccount,
    clock: &dyn Clock,
    store: &EventStore,
) -> Result<AccountView, LedgerError> {
    let account = BankAccount::open(
        command.account_id,
        &command.account_holder,
        command.initial_balance,
        command.currency.as_deref(),
        clock,
    )?;
    persist(command.account_id, account, store).await
}

/// Handles the `Deposit` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown account, an
/// `AccountError` if the deposit is refused, or a `DomainError` if loading or
/// appending fails.
pub async fn handle_deposit(
    command: &Deposit,
    clock: &dyn Clock,
    store: &EventStore,
) -> Result<AccountView, LedgerError> {
    let mut account = load_account(command.account_id, store).await?;
    account.deposit(command.amount, &command.description, clock)?;
    persist(command.account_id, account, store).await
}

/// Handles the `Withdraw` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown account, an
/// `AccountError` if the withdrawal is refused, or a `DomainError` if loading
/// or appending fails.
pub async fn handle_withdraw(
    command: &Withdraw,
    clock: &dyn Clock,
    store: &EventStore,
) -> Result<AccountView, LedgerError> {
    let mut account = load_account(command.account_id, store).await?;
    account.withdraw(command.amount, &command.description, clock)?;
    persist(command.account_id, account, store).await
}

/// Handles the `ChangeAccountHolder` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown account, an
/// `AccountError` if the rename is refused, or a `DomainError` if loading or
/// appending fails.
pub async fn handle_change_holder(
    command: &ChangeAccountHolder,
    clock: &dyn Clock,
    store: &EventStore,
) -> Result<AccountView, LedgerError> {
    let mut account = load_account(command.account_id, store).await?;
    account.change_holder(&command.new_name, clock)?;
    persist(command.account_id, account, store).await
}

/// Handles the `CloseAccount` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown account, an
/// `AccountError` if closing is refused, or a `DomainError` if loading or
/// appending fails.
pub async fn handle_close_account(
    command: &CloseAccount,
    clock: &dyn Clock,
    store: &EventStore,
) -> Result<AccountView, LedgerError> {
    let mut account = load_account(command.account_id, store).await?;
    account.close(&command.reason, clock)?;
    persist(command.account_id, account, store).await
}
