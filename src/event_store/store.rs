//! Event Store
//!
//! Core implementation of the Event Store pattern: a single in-process,
//! append-only, versioned log of immutable events, keyed by aggregate
//! stream and globally ordered by sequence number.
//!
//! All appends pass through one write lock, which doubles as the critical
//! section for the global sequence counter: the global order is a valid
//! linearization of all per-aggregate appends. Reads copy the relevant
//! slice of the log and never block other readers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::EventStoreError;

/// An event as recorded in the log
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    /// Global, monotonically increasing position across all streams
    pub sequence_number: i64,
    /// Unique identifier of this event
    pub event_id: Uuid,
    /// Stream this event belongs to
    pub aggregate_id: Uuid,
    /// Discriminated tag of the payload
    pub event_type: String,
    /// Structured payload, fixed shape per event type
    pub event_data: serde_json::Value,
    /// Stream-local version, starts at 1 with no gaps
    pub version: i64,
    /// When the event occurred
    pub occurred_at: DateTime<Utc>,
}

/// An event waiting to be appended to a stream
#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl PendingEvent {
    /// Create a new pending event from a serializable domain event
    pub fn new<E: Serialize>(
        event_type: &str,
        occurred_at: DateTime<Utc>,
        event: &E,
    ) -> Result<Self, EventStoreError> {
        let event_data = serde_json::to_value(event)?;
        Ok(Self {
            event_type: event_type.to_string(),
            event_data,
            occurred_at,
        })
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    /// The global log in sequence order; sequence_number == index + 1
    log: Vec<RecordedEvent>,
    /// Per-stream indexes into `log`, in version order
    streams: HashMap<Uuid, Vec<usize>>,
    /// Stream ids in order of first append
    stream_order: Vec<Uuid>,
}

/// Event Store for persisting and retrieving events
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl EventStore {
    /// Create a new, empty EventStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of events to a stream with an optimistic concurrency
    /// check.
    ///
    /// Each event is assigned the next stream-local version after
    /// `expected_version` and a fresh, globally increasing sequence number.
    /// The batch is atomic: either all events become visible or none do.
    ///
    /// # Errors
    ///
    /// `EventStoreError::ConcurrencyConflict` if the stream's current
    /// version differs from `expected_version` (another writer interleaved).
    pub async fn append(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<PendingEvent>,
    ) -> Result<Vec<RecordedEvent>, EventStoreError> {
        let mut inner = self.inner.write().await;
        let inner = &mut *inner;

        let current_version = inner
            .streams
            .get(&aggregate_id)
            .map(|indexes| indexes.len() as i64)
            .unwrap_or(0);

        if current_version != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        let mut recorded = Vec::with_capacity(events.len());

        for (offset, event) in events.into_iter().enumerate() {
            let sequence_number = inner.log.len() as i64 + 1;
            let version = expected_version + offset as i64 + 1;

            let record = RecordedEvent {
                sequence_number,
                event_id: Uuid::new_v4(),
                aggregate_id,
                event_type: event.event_type,
                event_data: event.event_data,
                version,
                occurred_at: event.occurred_at,
            };

            let index = inner.log.len();
            inner.log.push(record.clone());
            match inner.streams.entry(aggregate_id) {
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    entry.get_mut().push(index);
                }
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(vec![index]);
                    inner.stream_order.push(aggregate_id);
                }
            }
            recorded.push(record);
        }

        Ok(recorded)
    }

    /// Read the ordered event sequence of one stream within
    /// `[from_version, to_version]`; empty if the aggregate never existed.
    pub async fn read_stream(
        &self,
        aggregate_id: Uuid,
        from_version: i64,
        to_version: Option<i64>,
    ) -> Vec<RecordedEvent> {
        let inner = self.inner.read().await;
        let to_version = to_version.unwrap_or(i64::MAX);

        inner
            .streams
            .get(&aggregate_id)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| inner.log[index].clone())
                    .filter(|event| event.version >= from_version && event.version <= to_version)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Read all events across all aggregates in global sequence order,
    /// starting at `from_sequence`.
    pub async fn read_all(&self, from_sequence: i64) -> Vec<RecordedEvent> {
        let inner = self.inner.read().await;
        let skip = from_sequence.saturating_sub(1).max(0) as usize;
        inner.log.iter().skip(skip).cloned().collect()
    }

    /// Get the current version of a stream (0 if it never existed)
    pub async fn current_version(&self, aggregate_id: Uuid) -> i64 {
        let inner = self.inner.read().await;
        inner
            .streams
            .get(&aggregate_id)
            .map(|indexes| indexes.len() as i64)
            .unwrap_or(0)
    }

    /// List all known aggregate ids in order of first append
    pub async fn aggregate_ids(&self) -> Vec<Uuid> {
        let inner = self.inner.read().await;
        inner.stream_order.clone()
    }
}
