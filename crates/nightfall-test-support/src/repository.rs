//! Test repositories: `SnapshotRepository` doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use nightfall_core::error::DomainError;
use nightfall_core::snapshot::{SnapshotRepository, StoredSnapshot};
use uuid::Uuid;

/// A snapshot repository that records every `save` and returns the most
/// recently saved (or seeded) snapshot from `load_latest`.
#[derive(Debug, Default)]
pub struct RecordingSnapshotRepository {
    saved: Mutex<Vec<(Uuid, StoredSnapshot)>>,
}

impl RecordingSnapshotRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository whose `load_latest` returns `snapshot` until
    /// something else is saved.
    #[must_use]
    pub fn seeded(snapshot: StoredSnapshot) -> Self {
        Self {
            saved: Mutex::new(vec![(snapshot.session_id, snapshot)]),
        }
    }

    /// Returns every snapshot saved so far, including a seeded one.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved_snapshots(&self) -> Vec<(Uuid, StoredSnapshot)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotRepository for RecordingSnapshotRepository {
    async fn save(&self, session_id: Uuid, snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        self.saved
            .lock()
            .unwrap()
            .push((session_id, snapshot.clone()));
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .last()
            .map(|(_, snapshot)| snapshot.clone()))
    }
}

/// A snapshot repository with nothing in it that silently accepts saves.
/// Useful for "fresh game" scenarios.
#[derive(Debug)]
pub struct EmptySnapshotRepository;

#[async_trait]
impl SnapshotRepository for EmptySnapshotRepository {
    async fn save(&self, _session_id: Uuid, _snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        Ok(None)
    }
}

/// A snapshot repository that always returns an infrastructure error. Useful
/// for testing that persistence failures are swallowed.
#[derive(Debug)]
pub struct FailingSnapshotRepository;

#[async_trait]
impl SnapshotRepository for FailingSnapshotRepository {
    async fn save(&self, _session_id: Uuid, _snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
