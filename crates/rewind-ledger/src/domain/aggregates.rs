//! Aggregate roots for the ledger.

use chrono::{DateTime, Utc};
use rewind_core::aggregate::{Aggregate, AggregateRoot};
use rewind_core::clock::Clock;
use rewind_core::event::Event;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::errors::AccountError;
use crate::domain::events::{
    AccountClosed, AccountCreated, AccountEventKind, AccountHolderChanged, MoneyDeposited,
    MoneyWithdrawn,
};

/// Currency used when an account is opened without one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Derived state of a bank account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    /// Aggregate identifier, `None` until the account is opened.
    pub id: Option<Uuid>,
    /// Current holder name.
    pub account_holder: String,
    /// Current balance.
    pub balance: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Whether the account has been closed.
    pub is_closed: bool,
    /// When the close event occurred.
    pub closed_at: Option<DateTime<Utc>>,
}

impl Default for AccountState {
    fn default() -> Self {
        Self {
            id: None,
            account_holder: String::new(),
            balance: Decimal::ZERO,
            currency: DEFAULT_CURRENCY.to_owned(),
            is_closed: false,
            closed_at: None,
        }
    }
}

impl Aggregate for AccountState {
    type Payload = AccountEventKind;
    const AGGREGATE_TYPE: &'static str = "BankAccount";

    fn aggregate_id(&self) -> Option<Uuid> {
        self.id
    }

    fn apply(mut self, event: &Event<AccountEventKind>) -> Self {
        match event.kind() {
            AccountEventKind::AccountCreated(e) => {
                self.id = Some(e.account_id);
                self.account_holder.clone_from(&e.account_holder);
                self.balance = e.initial_balance;
                self.currency.clone_from(&e.currency);
            }
            AccountEventKind::MoneyDeposited(e) => self.balance = e.balance_after,
            AccountEventKind::MoneyWithdrawn(e) => self.balance = e.balance_after,
            AccountEventKind::AccountHolderChanged(e) => {
                self.account_holder.clone_from(&e.new_name);
            }
            AccountEventKind::AccountClosed(_) => {
                self.is_closed = true;
                self.closed_at = Some(event.occurred_at());
            }
        }
        self
    }
}

/// The aggregate root for a bank account.
///
/// Every operation either raises exactly one event or returns an
/// [`AccountError`] and leaves the account untouched. A root with no
/// creation event refuses every mutation with `AccountError::NotOpened`.
#[derive(Debug, Clone)]
pub struct BankAccount {
    root: AggregateRoot<AccountState>,
}

impl From<AggregateRoot<AccountState>> for BankAccount {
    fn from(root: AggregateRoot<AccountState>) -> Self {
        Self { root }
    }
}

impl BankAccount {
    /// Opens a new account. A blank `currency` falls back to `USD`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidArgument` if the holder name is blank or
    /// the initial balance is negative.
    pub fn open(
        account_id: Uuid,
        account_holder: &str,
        initial_balance: Decimal,
        currency: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<Self, AccountError> {
        if account_holder.trim().is_empty() {
            return Err(AccountError::InvalidArgument(
                "account holder name is required".into(),
            ));
        }
        if initial_balance < Decimal::ZERO {
            return Err(AccountError::InvalidArgument(
                "initial balance cannot be negative".into(),
            ));
        }
        let currency = currency
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY);

        let mut root = AggregateRoot::new();
        root.raise(Event::new(
            AccountEventKind::AccountCreated(AccountCreated {
                account_id,
                account_holder: account_holder.to_owned(),
                initial_balance,
                currency: currency.to_owned(),
            }),
            clock,
        ));
        Ok(Self { root })
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        self.root.id()
    }

    /// Returns the derived state.
    #[must_use]
    pub fn state(&self) -> &AccountState {
        self.root.state()
    }

    /// Returns the current version.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.root.version()
    }

    /// Returns the underlying root for persistence.
    pub fn root_mut(&mut self) -> &mut AggregateRoot<AccountState> {
        &mut self.root
    }

    /// Returns the underlying root.
    #[must_use]
    pub fn root(&self) -> &AggregateRoot<AccountState> {
        &self.root
    }

    fn account_id(&self) -> Result<Uuid, AccountError> {
        self.root.id().ok_or(AccountError::NotOpened)
    }

    fn ensure_open(&self) -> Result<Uuid, AccountError> {
        let account_id = self.account_id()?;
        if self.state().is_closed {
            return Err(AccountError::AccountClosed);
        }
        Ok(account_id)
    }

    /// Deposits `amount`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AccountClosed` on a closed account and
    /// `AccountError::InvalidAmount` if `amount` is not positive or the new
    /// balance would overflow.
    pub fn deposit(
        &mut self,
        amount: Decimal,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<(), AccountError> {
        let account_id = self.ensure_open()?;
        if amount <= Decimal::ZERO {
            return Err(AccountError::InvalidAmount(
                "deposit amount must be positive".into(),
            ));
        }
        let balance_after = self.state().balance.checked_add(amount).ok_or_else(|| {
            AccountError::InvalidAmount("deposit would overflow the balance".into())
        })?;

        self.root.raise(Event::new(
            AccountEventKind::MoneyDeposited(MoneyDeposited {
                account_id,
                amount,
                description: description.to_owned(),
                balance_after,
            }),
            clock,
        ));
        Ok(())
    }

    /// Withdraws `amount`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AccountClosed` on a closed account,
    /// `AccountError::InvalidAmount` if `amount` is not positive and
    /// `AccountError::InsufficientFunds` if it exceeds the balance.
    pub fn withdraw(
        &mut self,
        amount: Decimal,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<(), AccountError> {
        let account_id = self.ensure_open()?;
        if amount <= Decimal::ZERO {
            return Err(AccountError::InvalidAmount(
                "withdrawal amount must be positive".into(),
            ));
        }
        let available = self.state().balance;
        if amount > available {
            return Err(AccountError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        self.root.raise(Event::new(
            AccountEventKind::MoneyWithdrawn(MoneyWithdrawn {
                account_id,
                amount,
                description: description.to_owned(),
                balance_after: available - amount,
            }),
            clock,
        ));
        Ok(())
    }

    /// Renames the account holder.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AccountClosed` on a closed account,
    /// `AccountError::InvalidArgument` if `new_name` is blank and
    /// `AccountError::NoChange` if it equals the current name.
    pub fn change_holder(&mut self, new_name: &str, clock: &dyn Clock) -> Result<(), AccountError> {
        let account_id = self.ensure_open()?;
        if new_name.trim().is_empty() {
            return Err(AccountError::InvalidArgument(
                "new account holder name is required".into(),
            ));
        }
        if new_name == self.state().account_holder {
            return Err(AccountError::NoChange);
        }

        let old_name = self.state().account_holder.clone();
        self.root.raise(Event::new(
            AccountEventKind::AccountHolderChanged(AccountHolderChanged {
                account_id,
                old_name,
                new_name: new_name.to_owned(),
            }),
            clock,
        ));
        Ok(())
    }

    /// Closes the account, recording the balance at closing.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AlreadyClosed` if the account is closed and
    /// `AccountError::InvalidArgument` if `reason` is blank.
    pub fn close(&mut self, reason: &str, clock: &dyn Clock) -> Result<(), AccountError> {
        let account_id = self.account_id()?;
        if self.state().is_closed {
            return Err(AccountError::AlreadyClosed);
        }
        if reason.trim().is_empty() {
            return Err(AccountError::InvalidArgument(
                "a reason for closing is required".into(),
            ));
        }

        let final_balance = self.state().balance;
        self.root.raise(Event::new(
            AccountEventKind::AccountClosed(AccountClosed {
                account_id,
                reason: reason.to_owned(),
                final_balance,
            }),
            clock,
        ));
        Ok(())
    }
}
