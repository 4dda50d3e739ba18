//! Projection trait and position tracking.

use aggregate_store::{EventEnvelope, EventId};
use async_trait::async_trait;

use crate::Result;

/// How far a projection has read into the published event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events handled, including ones the projection ignored.
    pub events_processed: u64,

    /// Identity of the last event handled.
    pub last_event_id: Option<EventId>,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns the position after handling `event`.
    pub fn advance(&self, event: &EventEnvelope) -> Self {
        Self {
            events_processed: self.events_processed + 1,
            last_event_id: Some(event.event_id),
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// A projection that turns published events into a read model.
///
/// Every event is offered to every projection; a projection that does not
/// care about an event still advances its position.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single event, updating the projection's read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}
