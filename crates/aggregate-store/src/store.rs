use std::sync::Arc;

use async_trait::async_trait;

use crate::{AggregateId, AggregateRecord, EventEnvelope, Result, Version};

/// Options for saving an aggregate record.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Version the caller loaded. If None, no version check is performed.
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects the stored record to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Expects no record to exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Persistence port: loads and stores aggregates by identity.
///
/// Implementations must detect concurrent writers: when
/// `options.expected_version` is set and does not match the stored version,
/// `save` fails with `ConcurrencyConflict` and nothing is written.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Returns the latest record for an aggregate, or None if it was never saved.
    async fn find_by_id(&self, aggregate_id: AggregateId) -> Result<Option<AggregateRecord>>;

    /// Stores a record and returns the version assigned to it.
    async fn save(&self, record: AggregateRecord, options: SaveOptions) -> Result<Version>;
}

/// Event publisher port.
///
/// Called once per event, in emission order, after the producing save
/// succeeded. Retrying a failed publish is the caller's decision.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<()>;
}

#[async_trait]
impl<T: AggregateStore + ?Sized> AggregateStore for Arc<T> {
    async fn find_by_id(&self, aggregate_id: AggregateId) -> Result<Option<AggregateRecord>> {
        (**self).find_by_id(aggregate_id).await
    }

    async fn save(&self, record: AggregateRecord, options: SaveOptions) -> Result<Version> {
        (**self).save(record, options).await
    }
}

#[async_trait]
impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    async fn publish(&self, event: EventEnvelope) -> Result<()> {
        (**self).publish(event).await
    }
}
