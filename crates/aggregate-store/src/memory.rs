use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    AggregateId, AggregateRecord, EventEnvelope, Result, StoreError, Version,
    store::{AggregateStore, EventPublisher, SaveOptions},
};

/// In-memory aggregate store.
///
/// Keeps the latest record per aggregate and enforces the same optimistic
/// concurrency rules a database-backed store would.
#[derive(Clone, Default)]
pub struct InMemoryAggregateStore {
    records: Arc<RwLock<HashMap<AggregateId, AggregateRecord>>>,
}

impl InMemoryAggregateStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored aggregates.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Removes every record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl AggregateStore for InMemoryAggregateStore {
    async fn find_by_id(&self, aggregate_id: AggregateId) -> Result<Option<AggregateRecord>> {
        Ok(self.records.read().await.get(&aggregate_id).cloned())
    }

    async fn save(&self, mut record: AggregateRecord, options: SaveOptions) -> Result<Version> {
        let aggregate_id = record.aggregate_id;
        let mut records = self.records.write().await;

        let current_version = match records.get(&aggregate_id) {
            Some(existing) => {
                if existing.aggregate_type != record.aggregate_type {
                    return Err(StoreError::AggregateTypeMismatch {
                        aggregate_id,
                        stored: existing.aggregate_type.clone(),
                        requested: record.aggregate_type,
                    });
                }
                existing.version
            }
            None => Version::initial(),
        };

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            tracing::debug!(%aggregate_id, %expected, actual = %current_version, "save rejected");
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        let new_version = current_version.next();
        record.version = new_version;
        record.updated_at = Utc::now();
        records.insert(aggregate_id, record);

        Ok(new_version)
    }
}

#[derive(Debug, Default)]
struct PublisherState {
    published: Vec<EventEnvelope>,
    fail_on_publish: bool,
    remaining_before_failure: Option<usize>,
}

/// In-memory event publisher that records every envelope it receives.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<PublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a new publisher with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every subsequent publish to fail or succeed, dropping any
    /// budget set with [`fail_after`](Self::fail_after).
    pub async fn set_fail_on_publish(&self, fail: bool) {
        let mut state = self.state.write().await;
        state.fail_on_publish = fail;
        state.remaining_before_failure = None;
    }

    /// Lets `count` more publishes succeed, then fails the rest.
    pub async fn fail_after(&self, count: usize) {
        self.state.write().await.remaining_before_failure = Some(count);
    }

    /// Returns every envelope published so far, in publish order.
    pub async fn published(&self) -> Vec<EventEnvelope> {
        self.state.read().await.published.clone()
    }

    /// Returns the event types published so far, in publish order.
    pub async fn published_types(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .published
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    /// Returns the number of envelopes published so far.
    pub async fn published_count(&self) -> usize {
        self.state.read().await.published.len()
    }

    /// Forgets every recorded envelope.
    pub async fn clear(&self) {
        self.state.write().await.published.clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<()> {
        let mut state = self.state.write().await;

        if state.fail_on_publish {
            return Err(StoreError::Publish(format!(
                "publisher unavailable for {}",
                event.event_type
            )));
        }

        if let Some(remaining) = state.remaining_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(StoreError::Publish(format!(
                    "publisher unavailable for {}",
                    event.event_type
                )));
            }
            *remaining -= 1;
        }

        state.published.push(event);
        Ok(())
    }
}
