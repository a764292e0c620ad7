//! Shared test setup
//!
//! Builds the application router over a fresh in-memory event store.

use axum::Router;
use eventbank::api;
use eventbank::event_store::EventStore;

/// Build a test application with its backing store
pub fn setup_test_app() -> (Router, EventStore) {
    let store = EventStore::new();
    let app = api::create_router().with_state(store.clone());
    (app, store)
}
