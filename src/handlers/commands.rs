//! Command definitions
//!
//! Commands represent intentions to change the system state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to open a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAccountCommand {
    pub account_holder_name: String,
    pub initial_deposit: Decimal,
}

impl OpenAccountCommand {
    pub fn new(account_holder_name: impl Into<String>, initial_deposit: Decimal) -> Self {
        Self {
            account_holder_name: account_holder_name.into(),
            initial_deposit,
        }
    }
}

/// Command to deposit money into an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub account_id: Uuid,
    pub amount: Decimal,
    pub description: String,
}

impl DepositCommand {
    pub fn new(account_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            amount,
            description: description.into(),
        }
    }
}

/// Command to withdraw money from an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawCommand {
    pub account_id: Uuid,
    pub amount: Decimal,
    pub description: String,
}

impl WithdrawCommand {
    pub fn new(account_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            amount,
            description: description.into(),
        }
    }
}

/// Command to transfer money between two accounts.
///
/// A transfer spans two streams; see `TransferHandler` for the two-step
/// policy and its compensation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Decimal,
    pub description: String,
}

impl TransferCommand {
    pub fn new(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            description: description.into(),
        }
    }
}

/// Command to close an account (terminal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseAccountCommand {
    pub account_id: Uuid,
    pub reason: String,
}

impl CloseAccountCommand {
    pub fn new(account_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            account_id,
            reason: reason.into(),
        }
    }
}
