//! Aggregate Repository
//!
//! Reconstructs aggregates by replaying their event streams, optionally
//! bounded by a point in time. Aggregates have no storage representation of
//! their own; state is always the fold of the stream.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::aggregate::Aggregate;

use super::{EventStore, EventStoreError, RecordedEvent};

/// Repository that loads aggregates from the event store by replay
#[derive(Debug, Clone)]
pub struct Repository {
    store: EventStore,
}

impl Repository {
    /// Create a new repository over an event store
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }

    /// Load an aggregate by replaying its full stream.
    ///
    /// The returned aggregate's `version()` is the expected version for the
    /// next append.
    ///
    /// # Errors
    ///
    /// `EventStoreError::AggregateNotFound` if the stream is empty.
    pub async fn load<A>(&self, aggregate_id: Uuid) -> Result<A, EventStoreError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let events = self.store.read_stream(aggregate_id, 0, None).await;
        if events.is_empty() {
            return Err(EventStoreError::AggregateNotFound(aggregate_id));
        }

        tracing::debug!(
            aggregate_type = A::aggregate_type(),
            aggregate_id = %aggregate_id,
            events = events.len(),
            "Replaying stream"
        );

        replay::<A>(events)
    }

    /// Load an aggregate as of a point in time.
    ///
    /// The fold only consumes events with `occurred_at <= point_in_time`.
    /// The stream is already in sequence order, so ties on the same instant
    /// are broken deterministically and repeated queries at the same point
    /// yield the same state. The result is a read-only snapshot: its version
    /// must never be used as the expected version for an append.
    ///
    /// # Errors
    ///
    /// `EventStoreError::AggregateNotFound` if no events qualify.
    pub async fn load_as_of<A>(
        &self,
        aggregate_id: Uuid,
        point_in_time: DateTime<Utc>,
    ) -> Result<A, EventStoreError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let events: Vec<RecordedEvent> = self
            .store
            .read_stream(aggregate_id, 0, None)
            .await
            .into_iter()
            .filter(|event| event.occurred_at <= point_in_time)
            .collect();

        if events.is_empty() {
            return Err(EventStoreError::AggregateNotFound(aggregate_id));
        }

        replay::<A>(events)
    }
}

fn replay<A>(events: Vec<RecordedEvent>) -> Result<A, EventStoreError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    let mut aggregate = A::default();
    for recorded in events {
        let event: A::Event = serde_json::from_value(recorded.event_data)?;
        aggregate = aggregate.apply(event);
    }
    Ok(aggregate)
}
