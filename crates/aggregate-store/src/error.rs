use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors raised by store and publisher adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The expected version did not match the stored version.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// A record exists under this id but belongs to another aggregate type.
    #[error("Aggregate {aggregate_id} is stored as {stored}, not {requested}")]
    AggregateTypeMismatch {
        aggregate_id: AggregateId,
        stored: String,
        requested: String,
    },

    /// An envelope was built without a required field.
    #[error("Event envelope is missing {0}")]
    IncompleteEnvelope(&'static str),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The publisher could not deliver an event.
    #[error("Publish error: {0}")]
    Publish(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
