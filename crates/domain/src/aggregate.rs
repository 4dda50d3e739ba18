//! Core aggregate and domain event traits.

use aggregate_store::Version;
use common::AggregateId;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name used in published envelopes.
    fn event_type(&self) -> &'static str;
}

/// Trait for state-stored aggregate roots that buffer the events they raise.
///
/// Mutating operations append to an ordered event buffer owned by the
/// aggregate. The buffer is not part of the persisted state; the command
/// handler drains it after a successful save and hands each event to a
/// publisher.
pub trait AggregateRoot: Serialize + DeserializeOwned + Send + Sync {
    /// The type of events this aggregate raises.
    type Event: DomainEvent;

    /// The type of errors its operations can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name used for storage and routing.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identity.
    fn id(&self) -> AggregateId;

    /// Returns the version this instance was loaded at (0 if never saved).
    fn version(&self) -> Version;

    /// Sets the version after a load or save.
    fn set_version(&mut self, version: Version);

    /// Returns the events raised since the buffer was last cleared, oldest first.
    fn pending_events(&self) -> &[Self::Event];

    /// Removes and returns every buffered event, oldest first.
    fn take_events(&mut self) -> Vec<Self::Event>;

    /// Discards every buffered event.
    fn clear_events(&mut self) {
        self.take_events();
    }

    /// Returns true if events are waiting to be published.
    fn has_pending_events(&self) -> bool {
        !self.pending_events().is_empty()
    }
}
