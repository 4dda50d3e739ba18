//! Persistence and event-publishing ports.
//!
//! Aggregates are stored as versioned JSON records behind [`AggregateStore`];
//! the events they buffer are delivered through [`EventPublisher`] wrapped in
//! an [`EventEnvelope`].

pub mod error;
pub mod event;
pub mod memory;
pub mod record;
pub mod store;

pub use common::AggregateId;
pub use error::{Result, StoreError};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::{InMemoryAggregateStore, InMemoryEventPublisher};
pub use record::AggregateRecord;
pub use store::{AggregateStore, EventPublisher, SaveOptions};
