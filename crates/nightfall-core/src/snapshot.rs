//! Snapshot repository abstraction.
//!
//! The engine persists one full snapshot of the session after every mutating
//! moderator action. Only the latest snapshot matters when restoring.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a session snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    /// Session the snapshot belongs to.
    pub session_id: Uuid,
    /// Session version (events applied) at the time of the snapshot.
    pub version: i64,
    /// Serialized snapshot body.
    pub payload: serde_json::Value,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}

/// Persistence adapter for session snapshots.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Stores a snapshot for `session_id`.
    async fn save(&self, session_id: Uuid, snapshot: &StoredSnapshot) -> Result<(), DomainError>;

    /// Loads the most recently saved snapshot across all sessions.
    /// `None` means a fresh game.
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, DomainError>;
}
