//! Win-condition evaluation.

use nightfall_roles::domain::catalog::Team;
use nightfall_roles::domain::roster::{Ledgers, PlayerId, Roster};
use serde::{Deserialize, Serialize};

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "winner", rename_all = "snake_case")]
pub enum Victory {
    /// The last two players alive are bonded.
    Lovers {
        /// The bonded pair, lower id first.
        pair: (PlayerId, PlayerId),
    },
    /// A lone solo-team player outlived everyone.
    Solo {
        /// The survivor.
        player: PlayerId,
    },
    /// Every werewolf and every solo player is dead.
    Village,
    /// Only werewolf-aligned players remain.
    Werewolves,
}

/// Checks the win conditions in priority order. `None` means the game goes
/// on.
#[must_use]
pub fn evaluate(roster: &Roster, ledgers: &Ledgers) -> Option<Victory> {
    let living: Vec<_> = roster.living(ledgers).collect();

    if let [a, b] = living.as_slice() {
        if a.love_partner == Some(b.id) && b.love_partner == Some(a.id) {
            let pair = if a.id < b.id { (a.id, b.id) } else { (b.id, a.id) };
            return Some(Victory::Lovers { pair });
        }
    }

    if let [survivor] = living.as_slice() {
        if survivor.team() == Team::Solo {
            return Some(Victory::Solo {
                player: survivor.id,
            });
        }
    }

    let wolves_alive = living.iter().any(|p| p.is_werewolf_aligned());
    let solos_alive = living.iter().any(|p| p.team() == Team::Solo);
    if !wolves_alive && !solos_alive {
        return Some(Victory::Village);
    }

    if !living.iter().any(|p| !p.is_werewolf_aligned()) {
        return Some(Victory::Werewolves);
    }

    None
}

/// Whether any win condition holds.
#[must_use]
pub fn is_game_over(roster: &Roster, ledgers: &Ledgers) -> bool {
    evaluate(roster, ledgers).is_some()
}
