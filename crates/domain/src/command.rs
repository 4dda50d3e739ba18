//! Command handling infrastructure.

use std::marker::PhantomData;

use aggregate_store::{
    AggregateRecord, AggregateStore, EventEnvelope, EventPublisher, SaveOptions, Version,
};
use common::AggregateId;

use crate::aggregate::{AggregateRoot, DomainEvent};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: AggregateRoot> {
    /// The aggregate after the command, with an empty event buffer.
    pub aggregate: A,

    /// The events that were raised and published, oldest first.
    pub events: Vec<A::Event>,

    /// The version the aggregate was saved at.
    pub new_version: Version,
}

/// Trait for commands that target an existing aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: AggregateRoot;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;
}

/// Handler for executing commands against state-stored aggregates.
///
/// The handler is responsible for:
/// 1. Loading the aggregate record and restoring its state
/// 2. Running the command, which mutates state and buffers events
/// 3. Saving the new state with optimistic concurrency
/// 4. Publishing the buffered events in order, then clearing the buffer
///
/// Nothing is saved or published when the command fails.
pub struct CommandHandler<S, P, A>
where
    S: AggregateStore,
    P: EventPublisher,
    A: AggregateRoot,
{
    store: S,
    publisher: P,
    _phantom: PhantomData<A>,
}

impl<S, P, A> CommandHandler<S, P, A>
where
    S: AggregateStore,
    P: EventPublisher,
    A: AggregateRoot,
{
    /// Creates a new command handler over a store and a publisher.
    pub fn new(store: S, publisher: P) -> Self {
        Self {
            store,
            publisher,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying aggregate store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the underlying event publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let Some(record) = self.store.find_by_id(aggregate_id).await? else {
            return Ok(None);
        };

        if record.aggregate_type != A::aggregate_type() {
            return Ok(None);
        }

        let version = record.version;
        let mut aggregate: A = record.into_state()?;
        aggregate.set_version(version);
        Ok(Some(aggregate))
    }

    /// Loads an aggregate, failing if it doesn't exist.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        self.load_existing(aggregate_id)
            .await?
            .ok_or_else(|| DomainError::AggregateNotFound {
                aggregate_type: A::aggregate_type(),
                aggregate_id: aggregate_id.to_string(),
            })
    }

    /// Runs a command against a freshly constructed aggregate and saves it
    /// as a new record.
    pub async fn create<F>(
        &self,
        mut aggregate: A,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&mut A) -> Result<(), A::Error>,
        DomainError: From<A::Error>,
    {
        command_fn(&mut aggregate)?;
        self.commit(aggregate, SaveOptions::expect_new()).await
    }

    /// Loads an aggregate, runs a command against it and saves the result.
    ///
    /// The save expects the version the aggregate was loaded at, so a
    /// concurrent writer causes a concurrency conflict instead of a lost
    /// update.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&mut A) -> Result<(), A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let loaded_version = aggregate.version();

        command_fn(&mut aggregate)?;

        self.commit(aggregate, SaveOptions::expect_version(loaded_version))
            .await
    }

    /// Executes a command against the aggregate it targets.
    pub async fn handle<C, F>(
        &self,
        command: &C,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        C: Command<Aggregate = A>,
        F: FnOnce(&mut A) -> Result<(), A::Error>,
        DomainError: From<A::Error>,
    {
        self.execute(command.aggregate_id(), command_fn).await
    }

    async fn commit(
        &self,
        mut aggregate: A,
        options: SaveOptions,
    ) -> Result<CommandResult<A>, DomainError> {
        let aggregate_id = aggregate.id();
        let record = AggregateRecord::from_state(aggregate_id, A::aggregate_type(), &aggregate)?;

        let new_version = self.store.save(record, options).await?;
        aggregate.set_version(new_version);

        let envelopes = self.build_envelopes(&aggregate, new_version)?;
        self.publish_all(envelopes).await?;

        let events = aggregate.take_events();
        tracing::debug!(
            %aggregate_id,
            aggregate_type = A::aggregate_type(),
            version = %new_version,
            events = events.len(),
            "aggregate committed"
        );

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Builds envelopes for the buffered events. Every envelope carries the
    /// saved version; `sequence` keeps them ordered within it.
    fn build_envelopes(
        &self,
        aggregate: &A,
        version: Version,
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(aggregate.pending_events().len());

        for (sequence, event) in aggregate.pending_events().iter().enumerate() {
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate.id())
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .sequence(sequence as u32)
                .payload(event)?
                .build()?;
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }

    async fn publish_all(&self, envelopes: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for (index, envelope) in envelopes.iter().enumerate() {
            if let Err(source) = self.publisher.publish(envelope.clone()).await {
                tracing::warn!(
                    event_type = %envelope.event_type,
                    aggregate_id = %envelope.aggregate_id,
                    published = index,
                    error = %source,
                    "event publish failed"
                );
                return Err(DomainError::PublishFailed {
                    published: index,
                    pending: envelopes[index..].to_vec(),
                    source,
                });
            }
        }
        Ok(())
    }
}
