//! Publisher that writes every event as a JSON line before handing it on.

use std::io::Write;
use std::sync::Arc;

use aggregate_store::{EventEnvelope, EventPublisher, StoreError};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Writes each envelope as one JSON line to a shared writer, then forwards
/// it to the downstream publisher.
///
/// The writer is shared so that error lines written by the runner interleave
/// with event lines in the order they happened.
pub struct EventLinePublisher<W, P> {
    output: Arc<Mutex<W>>,
    downstream: P,
}

impl<W, P> EventLinePublisher<W, P>
where
    W: Write + Send,
    P: EventPublisher,
{
    pub fn new(output: Arc<Mutex<W>>, downstream: P) -> Self {
        Self { output, downstream }
    }

    pub fn downstream(&self) -> &P {
        &self.downstream
    }
}

#[async_trait]
impl<W, P> EventPublisher for EventLinePublisher<W, P>
where
    W: Write + Send,
    P: EventPublisher,
{
    async fn publish(&self, event: EventEnvelope) -> aggregate_store::Result<()> {
        let line = serde_json::to_string(&event)?;
        {
            let mut output = self.output.lock().await;
            writeln!(output, "{line}")
                .map_err(|e| StoreError::Publish(format!("writing {}: {e}", event.event_type)))?;
        }
        self.downstream.publish(event).await
    }
}
