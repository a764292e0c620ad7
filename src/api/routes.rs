//! API Routes
//!
//! HTTP endpoint definitions under `/api/accounts`. The JSON field names
//! are camelCase to match the browser client's contract.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, BankAccount, TransactionKind};
use crate::error::AppError;
use crate::event_store::{EventStore, RecordedEvent, Repository};
use crate::handlers::{
    CloseAccountCommand, CloseAccountHandler, DepositCommand, DepositHandler, OpenAccountCommand,
    OpenAccountHandler, TransferCommand, TransferHandler, WithdrawCommand, WithdrawHandler,
};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAccountRequest {
    pub account_holder_name: String,
    pub initial_deposit: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub to_account_id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseAccountRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTravelRequest {
    pub point_in_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummaryResponse {
    pub id: Uuid,
    pub account_holder_name: String,
    pub balance: Decimal,
    pub is_closed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub account_holder_name: String,
    pub balance: Decimal,
    pub is_closed: bool,
    pub opened_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub transactions: Vec<TransactionResponse>,
}

impl From<&BankAccount> for AccountSummaryResponse {
    fn from(account: &BankAccount) -> Self {
        Self {
            id: account.id(),
            account_holder_name: account.account_holder_name().to_string(),
            balance: account.balance().value(),
            is_closed: account.is_closed(),
        }
    }
}

impl From<&BankAccount> for AccountResponse {
    fn from(account: &BankAccount) -> Self {
        Self {
            id: account.id(),
            account_holder_name: account.account_holder_name().to_string(),
            balance: account.balance().value(),
            is_closed: account.is_closed(),
            opened_at: account.opened_at(),
            closed_at: account.closed_at(),
            version: account.version(),
            transactions: account
                .transactions()
                .iter()
                .map(|entry| TransactionResponse {
                    date: entry.date,
                    kind: entry.kind,
                    amount: entry.amount,
                    balance_after: entry.balance_after,
                    description: entry.description.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogResponse {
    pub sequence_number: i64,
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub event_type: String,
    /// The payload as a JSON string, rendered raw by the event viewer
    pub event_data: String,
    pub version: i64,
    pub occurred_at: DateTime<Utc>,
}

impl TryFrom<RecordedEvent> for EventLogResponse {
    type Error = AppError;

    fn try_from(event: RecordedEvent) -> Result<Self, Self::Error> {
        let event_data = serde_json::to_string(&event.event_data)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self {
            sequence_number: event.sequence_number,
            event_id: event.event_id,
            aggregate_id: event.aggregate_id,
            event_type: event.event_type,
            event_data,
            version: event.version,
            occurred_at: event.occurred_at,
        })
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<EventStore> {
    Router::new()
        .route("/api/accounts", get(list_accounts).post(open_account))
        .route("/api/accounts/all-events", get(get_all_events))
        .route("/api/accounts/:id", get(get_account))
        .route("/api/accounts/:id/deposit", post(deposit))
        .route("/api/accounts/:id/withdraw", post(withdraw))
        .route("/api/accounts/:id/transfer", post(transfer))
        .route("/api/accounts/:id/close", post(close_account))
        .route("/api/accounts/:id/time-travel", post(time_travel))
        .route("/api/accounts/:id/events", get(get_account_events))
}

// =========================================================================
// GET /api/accounts
// =========================================================================

/// List all accounts with summary state
async fn list_accounts(
    State(store): State<EventStore>,
) -> Result<Json<Vec<AccountSummaryResponse>>, AppError> {
    let repository = Repository::new(store.clone());

    let mut accounts = Vec::new();
    for account_id in store.aggregate_ids().await {
        let account: BankAccount = repository.load(account_id).await?;
        accounts.push(AccountSummaryResponse::from(&account));
    }

    Ok(Json(accounts))
}

// =========================================================================
// GET /api/accounts/:id
// =========================================================================

/// Get a single account with full details
async fn get_account(
    State(store): State<EventStore>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let repository = Repository::new(store);
    let account: BankAccount = repository.load(account_id).await?;

    Ok(Json(AccountResponse::from(&account)))
}

// =========================================================================
// POST /api/accounts
// =========================================================================

/// Open a new account
async fn open_account(
    State(store): State<EventStore>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let handler = OpenAccountHandler::new(store);

    let command = OpenAccountCommand::new(request.account_holder_name, request.initial_deposit);
    let account = handler.execute(command).await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

// =========================================================================
// POST /api/accounts/:id/deposit
// =========================================================================

/// Deposit money into an account
async fn deposit(
    State(store): State<EventStore>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let handler = DepositHandler::new(store);

    let command = DepositCommand::new(account_id, request.amount, request.description);
    let account = handler.execute(command).await?;

    Ok(Json(AccountResponse::from(&account)))
}

// =========================================================================
// POST /api/accounts/:id/withdraw
// =========================================================================

/// Withdraw money from an account
async fn withdraw(
    State(store): State<EventStore>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let handler = WithdrawHandler::new(store);

    let command = WithdrawCommand::new(account_id, request.amount, request.description);
    let account = handler.execute(command).await?;

    Ok(Json(AccountResponse::from(&account)))
}

// =========================================================================
// POST /api/accounts/:id/transfer
// =========================================================================

/// Transfer money to another account, returning the updated source account
async fn transfer(
    State(store): State<EventStore>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let handler = TransferHandler::new(store);

    let command = TransferCommand::new(
        account_id,
        request.to_account_id,
        request.amount,
        request.description,
    );
    let account = handler.execute(command).await?;

    Ok(Json(AccountResponse::from(&account)))
}

// =========================================================================
// POST /api/accounts/:id/close
// =========================================================================

/// Close an account
async fn close_account(
    State(store): State<EventStore>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<CloseAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let handler = CloseAccountHandler::new(store);

    let command = CloseAccountCommand::new(account_id, request.reason);
    let account = handler.execute(command).await?;

    Ok(Json(AccountResponse::from(&account)))
}

// =========================================================================
// POST /api/accounts/:id/time-travel
// =========================================================================

/// Get the account state as of a point in time (read-only)
async fn time_travel(
    State(store): State<EventStore>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<TimeTravelRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let repository = Repository::new(store);
    let account: BankAccount = repository
        .load_as_of(account_id, request.point_in_time)
        .await?;

    Ok(Json(AccountResponse::from(&account)))
}

// =========================================================================
// GET /api/accounts/:id/events
// =========================================================================

/// Get the event log for one account, in sequence order.
///
/// An unknown account has an empty stream, so the response is an empty
/// array rather than a 404.
async fn get_account_events(
    State(store): State<EventStore>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<EventLogResponse>>, AppError> {
    let events = store.read_stream(account_id, 0, None).await;

    let entries = events
        .into_iter()
        .map(EventLogResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(entries))
}

// =========================================================================
// GET /api/accounts/all-events
// =========================================================================

/// Get all events across all accounts, ordered by sequence number
async fn get_all_events(
    State(store): State<EventStore>,
) -> Result<Json<Vec<EventLogResponse>>, AppError> {
    let events = store.read_all(0).await;

    let entries = events
        .into_iter()
        .map(EventLogResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(entries))
}
