//! Single-account command handlers
//!
//! Open, deposit, withdraw, and close each touch exactly one stream. The
//! write path is load → validate → append with the stream's loaded version
//! as the expected version; a concurrency conflict restarts the whole
//! sequence from a fresh load.

use uuid::Uuid;

use crate::aggregate::{Aggregate, BankAccount};
use crate::domain::Amount;
use crate::error::AppError;
use crate::event_store::{EventStore, EventStoreError, PendingEvent, Repository};

use super::{
    retry_delay, CloseAccountCommand, DepositCommand, OpenAccountCommand, WithdrawCommand,
    MAX_APPEND_RETRIES,
};

/// Handler for opening accounts
pub struct OpenAccountHandler {
    store: EventStore,
}

impl OpenAccountHandler {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }

    /// Execute the open-account command
    pub async fn execute(&self, command: OpenAccountCommand) -> Result<BankAccount, AppError> {
        let account_id = Uuid::new_v4();

        let (account, event) = BankAccount::open(
            account_id,
            &command.account_holder_name,
            command.initial_deposit,
        )?;

        let pending = PendingEvent::new(event.event_type(), event.occurred_at(), &event)?;
        // A freshly generated id cannot have a stream yet
        self.store.append(account_id, 0, vec![pending]).await?;

        tracing::info!(account_id = %account_id, "Account opened");

        Ok(account)
    }
}

/// Handler for deposits
pub struct DepositHandler {
    store: EventStore,
    repository: Repository,
}

impl DepositHandler {
    pub fn new(store: EventStore) -> Self {
        Self {
            repository: Repository::new(store.clone()),
            store,
        }
    }

    /// Execute the deposit command
    pub async fn execute(&self, command: DepositCommand) -> Result<BankAccount, AppError> {
        let amount =
            Amount::new(command.amount).map_err(|e| AppError::Validation(e.to_string()))?;

        for attempt in 0..MAX_APPEND_RETRIES {
            let account: BankAccount = self.repository.load(command.account_id).await?;
            let event = account.deposit(&amount, &command.description)?;
            let pending = PendingEvent::new(event.event_type(), event.occurred_at(), &event)?;

            match self
                .store
                .append(command.account_id, account.version(), vec![pending])
                .await
            {
                Ok(_) => return Ok(account.apply(event)),
                Err(err) if err.is_concurrency_conflict() && attempt + 1 < MAX_APPEND_RETRIES => {
                    tracing::warn!(
                        account_id = %command.account_id,
                        "Concurrency conflict on deposit, retrying (attempt {}/{})",
                        attempt + 1,
                        MAX_APPEND_RETRIES
                    );
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EventStoreError::MaxRetriesExceeded.into())
    }
}

/// Handler for withdrawals
pub struct WithdrawHandler {
    store: EventStore,
    repository: Repository,
}

impl WithdrawHandler {
    pub fn new(store: EventStore) -> Self {
        Self {
            repository: Repository::new(store.clone()),
            store,
        }
    }

    /// Execute the withdraw command
    pub async fn execute(&self, command: WithdrawCommand) -> Result<BankAccount, AppError> {
        let amount =
            Amount::new(command.amount).map_err(|e| AppError::Validation(e.to_string()))?;

        for attempt in 0..MAX_APPEND_RETRIES {
            let account: BankAccount = self.repository.load(command.account_id).await?;
            let event = account.withdraw(&amount, &command.description)?;
            let pending = PendingEvent::new(event.event_type(), event.occurred_at(), &event)?;

            match self
                .store
                .append(command.account_id, account.version(), vec![pending])
                .await
            {
                Ok(_) => return Ok(account.apply(event)),
                Err(err) if err.is_concurrency_conflict() && attempt + 1 < MAX_APPEND_RETRIES => {
                    tracing::warn!(
                        account_id = %command.account_id,
                        "Concurrency conflict on withdraw, retrying (attempt {}/{})",
                        attempt + 1,
                        MAX_APPEND_RETRIES
                    );
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EventStoreError::MaxRetriesExceeded.into())
    }
}

/// Handler for closing accounts
pub struct CloseAccountHandler {
    store: EventStore,
    repository: Repository,
}

impl CloseAccountHandler {
    pub fn new(store: EventStore) -> Self {
        Self {
            repository: Repository::new(store.clone()),
            store,
        }
    }

    /// Execute the close-account command
    pub async fn execute(&self, command: CloseAccountCommand) -> Result<BankAccount, AppError> {
        for attempt in 0..MAX_APPEND_RETRIES {
            let account: BankAccount = self.repository.load(command.account_id).await?;
            let event = account.close(&command.reason)?;
            let pending = PendingEvent::new(event.event_type(), event.occurred_at(), &event)?;

            match self
                .store
                .append(command.account_id, account.version(), vec![pending])
                .await
            {
                Ok(_) => {
                    tracing::info!(account_id = %command.account_id, "Account closed");
                    return Ok(account.apply(event));
                }
                Err(err) if err.is_concurrency_conflict() && attempt + 1 < MAX_APPEND_RETRIES => {
                    tracing::warn!(
                        account_id = %command.account_id,
                        "Concurrency conflict on close, retrying (attempt {}/{})",
                        attempt + 1,
                        MAX_APPEND_RETRIES
                    );
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EventStoreError::MaxRetriesExceeded.into())
    }
}
