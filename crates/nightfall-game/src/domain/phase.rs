//! Game phases.

use std::fmt;

use nightfall_resolution::domain::victory::Victory;
use serde::{Deserialize, Serialize};

/// Where the game is. Every phase but `GameOver` carries the night number
/// of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Roles wake in sequence.
    Night(u32),
    /// The night's dead are announced.
    Morning(u32),
    /// The village debates.
    Discussion(u32),
    /// The village votes someone out.
    Execution(u32),
    /// A win condition holds.
    GameOver(Victory),
}

impl Phase {
    /// Night number of the current round, if the game is still running.
    #[must_use]
    pub const fn night(self) -> Option<u32> {
        match self {
            Self::Night(n) | Self::Morning(n) | Self::Discussion(n) | Self::Execution(n) => {
                Some(n)
            }
            Self::GameOver(_) => None,
        }
    }

    /// Phase name without the night number.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Night(_) => "night",
            Self::Morning(_) => "morning",
            Self::Discussion(_) => "discussion",
            Self::Execution(_) => "execution",
            Self::GameOver(_) => "game_over",
        }
    }

    /// Whether the game has ended.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::GameOver(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameOver(victory) => write!(f, "game_over({victory:?})"),
            other => match other.night() {
                Some(n) => write!(f, "{}({n})", other.name()),
                None => f.write_str(other.name()),
            },
        }
    }
}
