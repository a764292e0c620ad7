//! Domain Events
//!
//! Event definitions for Event Sourcing.
//! Events are immutable facts that have happened in the system.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account-related events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AccountEvent {
    /// Account was opened; the initial deposit is part of the opening event
    AccountOpened {
        account_id: Uuid,
        account_holder_name: String,
        initial_deposit: Decimal,
        opened_at: DateTime<Utc>,
    },

    /// Money was deposited into the account (balance increased)
    Deposited {
        account_id: Uuid,
        amount: Decimal,
        description: String,
        deposited_at: DateTime<Utc>,
    },

    /// Money was withdrawn from the account (balance decreased)
    Withdrawn {
        account_id: Uuid,
        amount: Decimal,
        description: String,
        withdrawn_at: DateTime<Utc>,
    },

    /// Money left the account as the debit leg of a transfer
    TransferredOut {
        account_id: Uuid,
        amount: Decimal,
        description: String,
        to_account_id: Uuid,
        transferred_at: DateTime<Utc>,
    },

    /// Money arrived in the account as the credit leg of a transfer
    TransferredIn {
        account_id: Uuid,
        amount: Decimal,
        description: String,
        from_account_id: Uuid,
        transferred_at: DateTime<Utc>,
    },

    /// Account was closed (terminal)
    AccountClosed {
        account_id: Uuid,
        reason: String,
        closed_at: DateTime<Utc>,
    },
}

impl AccountEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountOpened { .. } => "AccountOpened",
            AccountEvent::Deposited { .. } => "Deposited",
            AccountEvent::Withdrawn { .. } => "Withdrawn",
            AccountEvent::TransferredOut { .. } => "TransferredOut",
            AccountEvent::TransferredIn { .. } => "TransferredIn",
            AccountEvent::AccountClosed { .. } => "AccountClosed",
        }
    }

    /// Get the account ID this event relates to
    pub fn account_id(&self) -> Uuid {
        match self {
            AccountEvent::AccountOpened { account_id, .. } => *account_id,
            AccountEvent::Deposited { account_id, .. } => *account_id,
            AccountEvent::Withdrawn { account_id, .. } => *account_id,
            AccountEvent::TransferredOut { account_id, .. } => *account_id,
            AccountEvent::TransferredIn { account_id, .. } => *account_id,
            AccountEvent::AccountClosed { account_id, .. } => *account_id,
        }
    }

    /// Get the instant at which this event occurred
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::AccountOpened { opened_at, .. } => *opened_at,
            AccountEvent::Deposited { deposited_at, .. } => *deposited_at,
            AccountEvent::Withdrawn { withdrawn_at, .. } => *withdrawn_at,
            AccountEvent::TransferredOut { transferred_at, .. } => *transferred_at,
            AccountEvent::TransferredIn { transferred_at, .. } => *transferred_at,
            AccountEvent::AccountClosed { closed_at, .. } => *closed_at,
        }
    }
}
