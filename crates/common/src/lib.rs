//! Shared identifier types for the quality inspection system.

mod types;

pub use types::{AggregateId, ResultId};
