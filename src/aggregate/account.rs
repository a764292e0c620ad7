//! Bank Account Aggregate
//!
//! BankAccount is the consistency boundary for a single account ledger.
//! State is derived by folding the account's event stream, never stored
//! directly. Command methods validate business rules and produce events;
//! `apply` folds events into state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AccountEvent, Amount, Balance};
use crate::error::AppError;

use super::Aggregate;

/// Kind of entry in the derived transaction ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

/// A single row of the derived transaction ledger, with the running balance
/// after the event was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEntry {
    pub date: DateTime<Utc>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: String,
}

/// Bank Account Aggregate
///
/// Two states: Open (initial, entered by AccountOpened) and Closed
/// (terminal, entered by AccountClosed). All money movement is a self-loop
/// on Open.
#[derive(Debug, Clone, PartialEq)]
pub struct BankAccount {
    /// Unique account ID
    id: Uuid,

    /// Name of the account holder
    account_holder_name: String,

    /// Current balance (derived from events)
    balance: Balance,

    /// Whether an AccountClosed event has been applied
    is_closed: bool,

    /// When the account was opened
    opened_at: Option<DateTime<Utc>>,

    /// When the account was closed, if it was
    closed_at: Option<DateTime<Utc>>,

    /// Current version (number of events applied)
    version: i64,

    /// Derived ledger of amount-bearing events in stream order
    transactions: Vec<TransactionEntry>,
}

impl Default for BankAccount {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            account_holder_name: String::new(),
            balance: Balance::zero(),
            is_closed: false,
            opened_at: None,
            closed_at: None,
            version: 0,
            transactions: Vec::new(),
        }
    }
}

impl BankAccount {
    /// Open a new account and generate the opening event.
    ///
    /// The initial deposit, if any, is part of the opening event rather
    /// than a separate Deposited event.
    pub fn open(
        account_id: Uuid,
        account_holder_name: &str,
        initial_deposit: Decimal,
    ) -> Result<(Self, AccountEvent), AppError> {
        let name = account_holder_name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Account holder name must not be empty".to_string(),
            ));
        }
        if initial_deposit < Decimal::ZERO {
            return Err(AppError::Validation(
                "Initial deposit must not be negative".to_string(),
            ));
        }

        let now = Utc::now();

        let event = AccountEvent::AccountOpened {
            account_id,
            account_holder_name: name.to_string(),
            initial_deposit,
            opened_at: now,
        };

        let account = Self::default().apply(event.clone());

        Ok((account, event))
    }

    /// Deposit money into the account
    pub fn deposit(&self, amount: &Amount, description: &str) -> Result<AccountEvent, AppError> {
        if self.is_closed {
            return Err(AppError::AccountClosed);
        }

        Ok(AccountEvent::Deposited {
            account_id: self.id,
            amount: amount.value(),
            description: description.to_string(),
            deposited_at: Utc::now(),
        })
    }

    /// Withdraw money from the account
    pub fn withdraw(&self, amount: &Amount, description: &str) -> Result<AccountEvent, AppError> {
        if self.is_closed {
            return Err(AppError::AccountClosed);
        }
        if !self.balance.is_sufficient_for(amount) {
            return Err(AppError::InsufficientFunds);
        }

        Ok(AccountEvent::Withdrawn {
            account_id: self.id,
            amount: amount.value(),
            description: description.to_string(),
            withdrawn_at: Utc::now(),
        })
    }

    /// Produce the debit leg of a transfer to another account
    pub fn transfer_out(
        &self,
        amount: &Amount,
        description: &str,
        to_account_id: Uuid,
    ) -> Result<AccountEvent, AppError> {
        if self.is_closed {
            return Err(AppError::AccountClosed);
        }
        if !self.balance.is_sufficient_for(amount) {
            return Err(AppError::InsufficientFunds);
        }

        Ok(AccountEvent::TransferredOut {
            account_id: self.id,
            amount: amount.value(),
            description: description.to_string(),
            to_account_id,
            transferred_at: Utc::now(),
        })
    }

    /// Produce the credit leg of a transfer from another account
    pub fn transfer_in(
        &self,
        amount: &Amount,
        description: &str,
        from_account_id: Uuid,
    ) -> Result<AccountEvent, AppError> {
        if self.is_closed {
            return Err(AppError::AccountClosed);
        }

        Ok(AccountEvent::TransferredIn {
            account_id: self.id,
            amount: amount.value(),
            description: description.to_string(),
            from_account_id,
            transferred_at: Utc::now(),
        })
    }

    /// Close the account. Closing is terminal and permitted regardless of
    /// the current balance.
    pub fn close(&self, reason: &str) -> Result<AccountEvent, AppError> {
        if self.is_closed {
            return Err(AppError::AccountClosed);
        }

        Ok(AccountEvent::AccountClosed {
            account_id: self.id,
            reason: reason.to_string(),
            closed_at: Utc::now(),
        })
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn account_holder_name(&self) -> &str {
        &self.account_holder_name
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn transactions(&self) -> &[TransactionEntry] {
        &self.transactions
    }

    fn record_transaction(
        &mut self,
        date: DateTime<Utc>,
        kind: TransactionKind,
        amount: Decimal,
        description: String,
    ) {
        self.transactions.push(TransactionEntry {
            date,
            kind,
            amount,
            balance_after: self.balance.value(),
            description,
        });
    }
}

impl Aggregate for BankAccount {
    type Event = AccountEvent;

    fn aggregate_type() -> &'static str {
        "BankAccount"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(mut self, event: Self::Event) -> Self {
        match event {
            AccountEvent::AccountOpened {
                account_id,
                account_holder_name,
                initial_deposit,
                opened_at,
            } => {
                self.id = account_id;
                self.account_holder_name = account_holder_name;
                self.balance = Balance::new(initial_deposit);
                self.is_closed = false;
                self.opened_at = Some(opened_at);
            }

            AccountEvent::Deposited {
                amount,
                description,
                deposited_at,
                ..
            } => {
                self.balance = self.balance.credit(amount);
                self.record_transaction(deposited_at, TransactionKind::Deposit, amount, description);
            }

            AccountEvent::Withdrawn {
                amount,
                description,
                withdrawn_at,
                ..
            } => {
                self.balance = self.balance.debit(amount);
                self.record_transaction(
                    withdrawn_at,
                    TransactionKind::Withdrawal,
                    amount,
                    description,
                );
            }

            AccountEvent::TransferredOut {
                amount,
                description,
                transferred_at,
                ..
            } => {
                self.balance = self.balance.debit(amount);
                self.record_transaction(
                    transferred_at,
                    TransactionKind::Transfer,
                    amount,
                    description,
                );
            }

            AccountEvent::TransferredIn {
                amount,
                description,
                transferred_at,
                ..
            } => {
                self.balance = self.balance.credit(amount);
                self.record_transaction(
                    transferred_at,
                    TransactionKind::Transfer,
                    amount,
                    description,
                );
            }

            AccountEvent::AccountClosed { closed_at, .. } => {
                self.is_closed = true;
                self.closed_at = Some(closed_at);
            }
        }

        self.version += 1;
        self
    }
}
