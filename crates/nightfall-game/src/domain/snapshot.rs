//! Serializable snapshot of a game session.
//!
//! One snapshot is written after every moderator action and only the latest
//! one is ever read back. In-night progress (slot cursor, scratchpad) is not
//! part of it: a session restored mid-night replays that night from its
//! first slot.

use chrono::{DateTime, Utc};
use nightfall_core::error::DomainError;
use nightfall_core::snapshot::StoredSnapshot;
use nightfall_resolution::domain::pipeline::DeferredEffect;
use nightfall_resolution::domain::powers::SinglePowers;
use nightfall_roles::domain::roster::{Ledgers, PlayerId, Roster};
use nightfall_roles::domain::wake_order::WakeOrderConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregates::BorrowRecord;
use super::phase::Phase;

/// Everything needed to rebuild a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Session identifier.
    pub session_id: Uuid,
    /// Phase at the time of the snapshot.
    pub phase: Phase,
    /// Night counter (kept when the phase is `GameOver`).
    pub night: u32,
    /// Seconds the game has been running.
    pub elapsed_seconds: u64,
    /// Death ledgers.
    pub ledgers: Ledgers,
    /// Single-use power usage.
    pub powers: SinglePowers,
    /// Love bonds, lower id first. Mirrors the roster for payload readers.
    pub love_bonds: Vec<(PlayerId, PlayerId)>,
    /// Effects scheduled for the next night.
    pub deferred: Vec<DeferredEffect>,
    /// Hunter still owed a retaliation shot.
    pub hunter_pending: Option<PlayerId>,
    /// Full roster, infections included.
    pub roster: Roster,
    /// Wake order in use.
    pub wake_order: WakeOrderConfig,
    /// Whether dead players' roles are still called.
    pub include_dead_roles: bool,
    /// Player the protector shielded last night.
    pub previous_shield: Option<PlayerId>,
    /// Phase to go back to if a victory is undone.
    #[serde(default)]
    pub resume_phase: Option<Phase>,
    /// Powers the actor has borrowed so far.
    #[serde(default)]
    pub borrow_history: Vec<BorrowRecord>,
}

impl GameSnapshot {
    /// Wraps the snapshot for the repository.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the snapshot cannot be
    /// serialized.
    pub fn to_stored(
        &self,
        version: i64,
        saved_at: DateTime<Utc>,
    ) -> Result<StoredSnapshot, DomainError> {
        let payload = serde_json::to_value(self).map_err(|e| {
            DomainError::Infrastructure(format!("snapshot serialization failed: {e}"))
        })?;
        Ok(StoredSnapshot {
            session_id: self.session_id,
            version,
            payload,
            saved_at,
        })
    }

    /// Reads a snapshot back from the repository.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not
    /// deserialize (including a roster that no longer validates).
    pub fn from_stored(stored: &StoredSnapshot) -> Result<Self, DomainError> {
        serde_json::from_value(stored.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!("snapshot deserialization failed: {e}"))
        })
    }
}
