//! Projection processor: the publisher that feeds read models.

use aggregate_store::{EventEnvelope, EventPublisher, StoreError};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::Projection;

/// Delivers published events to every registered projection.
///
/// The processor is itself an [`EventPublisher`], so it can be handed to the
/// inspection service directly (usually behind an `Arc`). It keeps a journal
/// of every event it delivered so projections can be rebuilt from scratch.
#[derive(Default)]
pub struct ProjectionProcessor {
    projections: Vec<Box<dyn Projection>>,
    journal: RwLock<Vec<EventEnvelope>>,
}

impl ProjectionProcessor {
    /// Creates a processor with no projections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Returns the number of events delivered so far.
    pub async fn journal_len(&self) -> usize {
        self.journal.read().await.len()
    }

    /// Delivers a single event to all registered projections, in
    /// registration order, and journals it.
    ///
    /// A projection whose last handled event is this one is skipped, so
    /// redelivering an event after a partial failure only reaches the
    /// projections that have not seen it yet.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            if projection.position().await.last_event_id == Some(event.event_id) {
                tracing::debug!(
                    projection = projection.name(),
                    event_id = %event.event_id,
                    "event already handled, skipping"
                );
                continue;
            }
            projection.handle(event).await?;
            metrics::counter!("projections_events_processed", "projection" => projection.name())
                .increment(1);
        }

        let mut journal = self.journal.write().await;
        if journal.last().map(|e| e.event_id) != Some(event.event_id) {
            journal.push(event.clone());
        }
        Ok(())
    }

    /// Resets all projections and replays the journal into them.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        for projection in &self.projections {
            projection.reset().await?;
        }

        let journal = self.journal.read().await;
        for event in journal.iter() {
            for projection in &self.projections {
                projection.handle(event).await?;
            }
        }

        tracing::info!(events_replayed = journal.len(), "projections rebuilt");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for ProjectionProcessor {
    async fn publish(&self, event: EventEnvelope) -> aggregate_store::Result<()> {
        self.process_event(&event)
            .await
            .map_err(|e| StoreError::Publish(e.to_string()))
    }
}
