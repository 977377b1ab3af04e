//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots whose state only changes by applying events.
///
/// Command methods validate their input, build an event and hand it to
/// `apply`; the event is then kept as uncommitted until the application
/// layer has persisted the resulting state.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the number of events applied so far.
    fn version(&self) -> i64;

    /// Applies an event. This is the only place aggregate state mutates.
    fn apply(&mut self, event: &Self::Event);

    /// Returns events recorded since the last drain.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Drains and returns the events recorded since the last drain.
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event>;
}
