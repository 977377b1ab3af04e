//! Roster fixtures.

use nightfall_roles::domain::catalog::RoleId;
use nightfall_roles::domain::roster::{Player, PlayerId, Roster};

/// Builds a [`Roster`] seat by seat. Players are named `Player <id>`.
#[derive(Debug, Default)]
pub struct RosterBuilder {
    players: Vec<Player>,
}

impl RosterBuilder {
    /// Starts an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats the next player clockwise.
    #[must_use]
    pub fn player(mut self, id: u32, role: RoleId) -> Self {
        self.players.push(Player::new(id, format!("Player {id}"), role));
        self
    }

    /// Seats an actor able to borrow `powers`.
    #[must_use]
    pub fn actor(mut self, id: u32, powers: &[RoleId]) -> Self {
        let mut player = Player::new(id, format!("Player {id}"), RoleId::Actor);
        player.borrowed_powers = powers.to_vec();
        self.players.push(player);
        self
    }

    /// Bonds two already-seated players.
    ///
    /// # Panics
    ///
    /// Panics if either player has not been seated.
    #[must_use]
    pub fn bond(mut self, a: u32, b: u32) -> Self {
        for (from, to) in [(a, b), (b, a)] {
            let player = self
                .players
                .iter_mut()
                .find(|p| p.id == PlayerId(from))
                .expect("bond() requires both players to be seated first");
            player.love_partner = Some(PlayerId(to));
        }
        self
    }

    /// The seated players, without validation.
    #[must_use]
    pub fn into_players(self) -> Vec<Player> {
        self.players
    }

    /// Validates and builds the roster.
    ///
    /// # Panics
    ///
    /// Panics if the table violates a roster invariant.
    #[must_use]
    pub fn build(self) -> Roster {
        Roster::new(self.players).expect("RosterBuilder produced an invalid roster")
    }
}
