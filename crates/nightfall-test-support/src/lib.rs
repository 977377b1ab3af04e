//! Shared test doubles and fixtures for the Nightfall moderator engine.

mod clock;
mod repository;
mod roster;

pub use clock::FixedClock;
pub use repository::{EmptySnapshotRepository, FailingSnapshotRepository, RecordingSnapshotRepository};
pub use roster::RosterBuilder;
