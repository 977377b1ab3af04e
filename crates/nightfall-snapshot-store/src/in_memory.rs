//! In-process snapshot repository, used when no database is configured.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use nightfall_core::error::DomainError;
use nightfall_core::snapshot::{SnapshotRepository, StoredSnapshot};

/// Keeps the latest snapshot of every session in memory. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    snapshots: Mutex<Vec<StoredSnapshot>>,
}

impl InMemorySnapshotRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::Infrastructure("snapshot store lock poisoned".to_owned())
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn save(&self, session_id: Uuid, snapshot: &StoredSnapshot) -> Result<(), DomainError> {
        let mut snapshots = self.snapshots.lock().map_err(|_| poisoned())?;
        snapshots.retain(|s| s.session_id != session_id);
        snapshots.push(StoredSnapshot {
            session_id,
            ..snapshot.clone()
        });
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError> {
        let snapshots = self.snapshots.lock().map_err(|_| poisoned())?;
        Ok(snapshots
            .iter()
            .max_by_key(|s| (s.saved_at, s.version))
            .cloned())
    }
}
