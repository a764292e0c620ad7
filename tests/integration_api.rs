//! API Integration Tests
//!
//! Drives the full ledger lifecycle through the HTTP surface.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::util::ServiceExt;

mod common;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn decimal_field(json: &Value, field: &str) -> Decimal {
    json[field]
        .as_str()
        .unwrap_or_else(|| panic!("missing field {field} in {json}"))
        .parse()
        .unwrap()
}

async fn open_account(app: &Router, name: &str, initial_deposit: Decimal) -> Value {
    let (status, json) = send_json(
        app,
        "POST",
        "/api/accounts",
        Some(json!({
            "accountHolderName": name,
            "initialDeposit": initial_deposit,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Account opening failed");
    json
}

#[tokio::test]
async fn test_account_lifecycle_e2e() {
    let (app, _store) = common::setup_test_app();

    // 1. Open Alice's account with an initial deposit of 100
    let alice = open_account(&app, "Alice", dec!(100)).await;
    let alice_id = alice["id"].as_str().unwrap().to_string();
    assert_eq!(alice["version"], 1);
    assert_eq!(decimal_field(&alice, "balance"), dec!(100.00));
    assert_eq!(alice["isClosed"], false);

    // 2. Deposit a paycheck
    let (status, alice) = send_json(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/deposit"),
        Some(json!({"amount": 50, "description": "paycheck"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_field(&alice, "balance"), dec!(150.00));
    assert_eq!(alice["version"], 2);

    // Remember an instant strictly between the deposit and later events
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let between = chrono::Utc::now().to_rfc3339();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    // 3. An overdraft attempt is rejected and produces no event
    let (status, bytes) = send(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/withdraw"),
        Some(json!({"amount": 200, "description": "rent"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(String::from_utf8(bytes).unwrap(), "Insufficient funds");

    let (status, alice) =
        send_json(&app, "GET", &format!("/api/accounts/{alice_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_field(&alice, "balance"), dec!(150.00));
    assert_eq!(alice["version"], 2);

    // 4. Open Bob's account and transfer a gift
    let bob = open_account(&app, "Bob", dec!(0)).await;
    let bob_id = bob["id"].as_str().unwrap().to_string();

    let (status, alice) = send_json(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/transfer"),
        Some(json!({"toAccountId": bob_id, "amount": 50, "description": "gift"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_field(&alice, "balance"), dec!(100.00));
    assert_eq!(alice["version"], 3);

    let (status, bob) = send_json(&app, "GET", &format!("/api/accounts/{bob_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_field(&bob, "balance"), dec!(50.00));
    assert_eq!(bob["version"], 2);

    // Both transfer legs are visible in the global log, with consecutive
    // sequence numbers
    let (status, events) = send_json(&app, "GET", "/api/accounts/all-events", None).await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap();
    let out = &events[events.len() - 2];
    let incoming = &events[events.len() - 1];
    assert_eq!(out["eventType"], "TransferredOut");
    assert_eq!(incoming["eventType"], "TransferredIn");
    assert_eq!(
        incoming["sequenceNumber"].as_i64().unwrap(),
        out["sequenceNumber"].as_i64().unwrap() + 1
    );

    // 5. Time travel to the instant after the deposit: the rejected
    // withdrawal never happened
    let (status, snapshot) = send_json(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/time-travel"),
        Some(json!({"pointInTime": between})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_field(&snapshot, "balance"), dec!(150.00));
    assert_eq!(snapshot["version"], 2);

    // 6. Close Alice's account; the state is terminal
    let (status, alice) = send_json(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/close"),
        Some(json!({"reason": "moving banks"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alice["isClosed"], true);
    assert_eq!(alice["version"], 4);

    let (status, bytes) = send(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/deposit"),
        Some(json!({"amount": 10, "description": "late"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(String::from_utf8(bytes).unwrap(), "Account is closed");
}

#[tokio::test]
async fn test_list_accounts() {
    let (app, _store) = common::setup_test_app();

    open_account(&app, "Alice", dec!(100)).await;
    open_account(&app, "Bob", dec!(0)).await;

    let (status, accounts) = send_json(&app, "GET", "/api/accounts", None).await;
    assert_eq!(status, StatusCode::OK);

    let accounts = accounts.as_array().unwrap().clone();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0]["accountHolderName"], "Alice");
    assert_eq!(accounts[1]["accountHolderName"], "Bob");
    assert!(accounts[0].get("transactions").is_none());
}

#[tokio::test]
async fn test_account_detail_includes_transaction_ledger() {
    let (app, _store) = common::setup_test_app();

    let alice = open_account(&app, "Alice", dec!(100)).await;
    let alice_id = alice["id"].as_str().unwrap().to_string();

    send_json(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/deposit"),
        Some(json!({"amount": 50, "description": "paycheck"})),
    )
    .await;
    send_json(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/withdraw"),
        Some(json!({"amount": 30, "description": "rent"})),
    )
    .await;

    let (status, alice) =
        send_json(&app, "GET", &format!("/api/accounts/{alice_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let transactions = alice["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["type"], "Deposit");
    assert_eq!(decimal_field(&transactions[0], "balanceAfter"), dec!(150.00));
    assert_eq!(transactions[1]["type"], "Withdrawal");
    assert_eq!(decimal_field(&transactions[1], "balanceAfter"), dec!(120.00));
    assert_eq!(transactions[1]["description"], "rent");
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let (app, _store) = common::setup_test_app();
    let unknown = uuid::Uuid::new_v4();

    let (status, bytes) = send(&app, "GET", &format!("/api/accounts/{unknown}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8(bytes).unwrap().contains("Account not found"));

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/accounts/{unknown}/deposit"),
        Some(json!({"amount": 10, "description": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let (app, _store) = common::setup_test_app();

    let (status, bytes) = send(
        &app,
        "POST",
        "/api/accounts",
        Some(json!({"accountHolderName": "", "initialDeposit": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "Account holder name must not be empty"
    );

    let alice = open_account(&app, "Alice", dec!(100)).await;
    let alice_id = alice["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/deposit"),
        Some(json!({"amount": -5, "description": "negative"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/transfer"),
        Some(json!({"toAccountId": alice_id, "amount": 10, "description": "self"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transfer_to_closed_account_conflicts_without_debit() {
    let (app, _store) = common::setup_test_app();

    let alice = open_account(&app, "Alice", dec!(100)).await;
    let alice_id = alice["id"].as_str().unwrap().to_string();
    let bob = open_account(&app, "Bob", dec!(0)).await;
    let bob_id = bob["id"].as_str().unwrap().to_string();

    send_json(
        &app,
        "POST",
        &format!("/api/accounts/{bob_id}/close"),
        Some(json!({"reason": "fraud"})),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/transfer"),
        Some(json!({"toAccountId": bob_id, "amount": 50, "description": "gift"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The source was never debited
    let (_, alice) = send_json(&app, "GET", &format!("/api/accounts/{alice_id}"), None).await;
    assert_eq!(decimal_field(&alice, "balance"), dec!(100.00));
    assert_eq!(alice["version"], 1);
}

#[tokio::test]
async fn test_event_log_per_account_and_global() {
    let (app, _store) = common::setup_test_app();

    let alice = open_account(&app, "Alice", dec!(100)).await;
    let alice_id = alice["id"].as_str().unwrap().to_string();
    let bob = open_account(&app, "Bob", dec!(0)).await;
    let bob_id = bob["id"].as_str().unwrap().to_string();

    send_json(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/deposit"),
        Some(json!({"amount": 50, "description": "paycheck"})),
    )
    .await;

    // Per-account stream: only Alice's events, version-ordered
    let (status, events) =
        send_json(&app, "GET", &format!("/api/accounts/{alice_id}/events"), None).await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().unwrap().clone();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["eventType"], "AccountOpened");
    assert_eq!(events[0]["version"], 1);
    assert_eq!(events[1]["eventType"], "Deposited");
    assert_eq!(events[1]["version"], 2);
    for event in &events {
        assert_eq!(event["aggregateId"].as_str().unwrap(), alice_id);
        // eventData is a JSON string payload
        let payload: Value =
            serde_json::from_str(event["eventData"].as_str().unwrap()).unwrap();
        assert!(payload.get("type").is_some());
    }

    // Global log: all three events in sequence order
    let (status, all) = send_json(&app, "GET", "/api/accounts/all-events", None).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap().clone();
    assert_eq!(all.len(), 3);
    assert_eq!(
        all.iter()
            .map(|event| event["sequenceNumber"].as_i64().unwrap())
            .collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(all[1]["aggregateId"].as_str().unwrap(), bob_id);

    // Unknown accounts have an empty stream
    let unknown = uuid::Uuid::new_v4();
    let (status, events) =
        send_json(&app, "GET", &format!("/api/accounts/{unknown}/events"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(events.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_time_travel_before_opening_is_not_found() {
    let (app, _store) = common::setup_test_app();

    let alice = open_account(&app, "Alice", dec!(100)).await;
    let alice_id = alice["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/accounts/{alice_id}/time-travel"),
        Some(json!({"pointInTime": "2000-01-01T00:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
