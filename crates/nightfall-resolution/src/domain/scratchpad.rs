//! Per-night scratchpad.
//!
//! Handlers write the moderator's choices here; nothing in the scratchpad is
//! a death until the pipeline says so. It is reset at the start of every
//! night.

use nightfall_roles::domain::catalog::RoleId;
use nightfall_roles::domain::roster::PlayerId;
use serde::{Deserialize, Serialize};

/// A role revealed to the seer (or an actor borrowing its power).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revelation {
    /// Player looked at.
    pub target: PlayerId,
    /// Their role identity.
    pub role: RoleId,
}

/// In-progress selections for the current night.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scratchpad {
    /// Werewolf collective's chosen victim.
    pub devoured: Option<PlayerId>,
    /// Whether the collective asked to infect the victim instead.
    pub infection_requested: bool,
    /// Player shielded by the protector.
    pub shielded: Option<PlayerId>,
    /// Victim the witch chose to heal.
    pub witch_save: Option<PlayerId>,
    /// Target of the witch's poison.
    pub witch_kill: Option<PlayerId>,
    /// Seer results, shown to the moderator only.
    pub revealed: Vec<Revelation>,
    /// Power borrowed by the actor tonight.
    pub borrowed: Option<RoleId>,
}

impl Scratchpad {
    /// Whether nothing has been staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
