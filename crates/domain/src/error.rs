//! Domain error types.

use aggregate_store::{EventEnvelope, StoreError};
use thiserror::Error;

use crate::inspection::InspectionError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the aggregate store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The inspection order rejected the operation.
    #[error("Inspection error: {0}")]
    Inspection(#[from] InspectionError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The new state was saved but not every event reached the publisher.
    ///
    /// `pending` holds the undelivered envelopes in their original order so
    /// the caller can retry them.
    #[error("Published {published} event(s), {} still pending: {source}", .pending.len())]
    PublishFailed {
        published: usize,
        pending: Vec<EventEnvelope>,
        #[source]
        source: StoreError,
    },
}

impl DomainError {
    /// Returns true if the failure came from a stale expected version.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, DomainError::Store(StoreError::ConcurrencyConflict { .. }))
    }
}
