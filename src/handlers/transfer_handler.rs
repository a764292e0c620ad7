//! Transfer Handler
//!
//! Transfers span two streams, and the single-stream optimistic append
//! cannot commit both legs atomically. The policy here is two-fold:
//!
//! 1. The destination is re-validated immediately before debiting the
//!    source, shrinking the window in which the second leg can fail.
//! 2. If the credit leg still fails after the debit committed (the
//!    destination was closed concurrently, or its stream stayed contended
//!    past the retry limit), a compensating correction deposit is
//!    appended to the source so no bare debit ever survives.

use chrono::Utc;

use crate::aggregate::{Aggregate, BankAccount};
use crate::domain::{AccountEvent, Amount};
use crate::error::AppError;
use crate::event_store::{EventStore, EventStoreError, PendingEvent, Repository};

use super::{retry_delay, TransferCommand, MAX_APPEND_RETRIES};

/// Handler for transfers between accounts
pub struct TransferHandler {
    store: EventStore,
    repository: Repository,
}

impl TransferHandler {
    pub fn new(store: EventStore) -> Self {
        Self {
            repository: Repository::new(store.clone()),
            store,
        }
    }

    /// Execute the transfer command, returning the updated source account
    pub async fn execute(&self, command: TransferCommand) -> Result<BankAccount, AppError> {
        let amount =
            Amount::new(command.amount).map_err(|e| AppError::Validation(e.to_string()))?;

        if command.from_account_id == command.to_account_id {
            return Err(AppError::Validation(
                "Cannot transfer to the same account".to_string(),
            ));
        }

        let (source, out_event) = self.debit_source(&command, &amount).await?;

        match self.credit_destination(&command, &amount).await {
            Ok(()) => Ok(source.apply(out_event)),
            Err(err) => {
                tracing::warn!(
                    from_account_id = %command.from_account_id,
                    to_account_id = %command.to_account_id,
                    "Transfer credit leg failed after debit, compensating source: {}",
                    err
                );
                self.compensate_source(&command, &amount).await?;
                Err(err)
            }
        }
    }

    /// Debit leg: re-validate the destination, then append TransferredOut
    /// to the source stream.
    async fn debit_source(
        &self,
        command: &TransferCommand,
        amount: &Amount,
    ) -> Result<(BankAccount, AccountEvent), AppError> {
        for attempt in 0..MAX_APPEND_RETRIES {
            // Check destination eligibility before touching the source
            let destination: BankAccount = self.repository.load(command.to_account_id).await?;
            if destination.is_closed() {
                return Err(AppError::AccountClosed);
            }

            let source: BankAccount = self.repository.load(command.from_account_id).await?;
            let event =
                source.transfer_out(amount, &command.description, command.to_account_id)?;
            let pending = PendingEvent::new(event.event_type(), event.occurred_at(), &event)?;

            match self
                .store
                .append(command.from_account_id, source.version(), vec![pending])
                .await
            {
                Ok(_) => return Ok((source, event)),
                Err(err) if err.is_concurrency_conflict() && attempt + 1 < MAX_APPEND_RETRIES => {
                    tracing::warn!(
                        account_id = %command.from_account_id,
                        "Concurrency conflict on transfer debit, retrying (attempt {}/{})",
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

    /// Credit leg: append TransferredIn to the destination stream,
    /// retrying conflicts from a fresh load.
    async fn credit_destination(
        &self,
        command: &TransferCommand,
        amount: &Amount,
    ) -> Result<(), AppError> {
        for attempt in 0..MAX_APPEND_RETRIES {
            let destination: BankAccount = self.repository.load(command.to_account_id).await?;
            let event =
                destination.transfer_in(amount, &command.description, command.from_account_id)?;
            let pending = PendingEvent::new(event.event_type(), event.occurred_at(), &event)?;

            match self
                .store
                .append(command.to_account_id, destination.version(), vec![pending])
                .await
            {
                Ok(_) => return Ok(()),
                Err(err) if err.is_concurrency_conflict() && attempt + 1 < MAX_APPEND_RETRIES => {
                    tracing::warn!(
                        account_id = %command.to_account_id,
                        "Concurrency conflict on transfer credit, retrying (attempt {}/{})",
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

    /// Compensation: restore the source balance with a correction deposit.
    ///
    /// The correction event is constructed directly rather than going
    /// through the deposit command: the committed debit must be balanced
    /// out even if the source account was closed between the two legs.
    pub(crate) async fn compensate_source(
        &self,
        command: &TransferCommand,
        amount: &Amount,
    ) -> Result<(), AppError> {
        let description = format!("Transfer reversal: {}", command.description);

        for attempt in 0..MAX_APPEND_RETRIES {
            let source: BankAccount = self.repository.load(command.from_account_id).await?;

            let event = AccountEvent::Deposited {
                account_id: command.from_account_id,
                amount: amount.value(),
                description: description.clone(),
                deposited_at: Utc::now(),
            };
            let pending = PendingEvent::new(event.event_type(), event.occurred_at(), &event)?;

            match self
                .store
                .append(command.from_account_id, source.version(), vec![pending])
                .await
            {
                Ok(_) => {
                    tracing::info!(
                        account_id = %command.from_account_id,
                        "Transfer debit compensated"
                    );
                    return Ok(());
                }
                Err(err) if err.is_concurrency_conflict() && attempt + 1 < MAX_APPEND_RETRIES => {
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => {
                    tracing::error!(
                        account_id = %command.from_account_id,
                        "Failed to compensate transfer debit: {}",
                        err
                    );
                    return Err(err.into());
                }
            }
        }

        tracing::error!(
            account_id = %command.from_account_id,
            "Failed to compensate transfer debit: retries exhausted"
        );
        Err(EventStoreError::MaxRetriesExceeded.into())
    }
}
