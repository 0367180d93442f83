//! Commands for the ledger.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Command to open a new account.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    /// Identifier the new account will carry.
    pub account_id: Uuid,
    /// The account holder's name.
    pub account_holder: String,
    /// Opening balance; must not be negative.
    pub initial_balance: Decimal,
    /// ISO currency code; `USD` when absent.
    pub currency: Option<String>,
}

/// Command to deposit money.
#[derive(Debug, Clone)]
pub struct Deposit {
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount to deposit.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
}

/// Command to withdraw money.
#[derive(Debug, Clone)]
pub struct Withdraw {
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount to withdraw.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
}

/// Command to rename the account holder.
#[derive(Debug, Clone)]
pub struct ChangeAccountHolder {
    /// The account identifier.
    pub account_id: Uuid,
    /// The new holder name.
    pub new_name: String,
}

/// Command to close an account.
#[derive(Debug, Clone)]
pub struct CloseAccount {
    /// The account identifier.
    pub account_id: Uuid,
    /// Why the account is being closed.
    pub reason: String,
}
