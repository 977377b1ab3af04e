//! Roster and death ledgers.
//!
//! The roster is fixed at game start; the only later change to a player is
//! infection, recorded on the player itself. Seat order is the order players
//! were supplied in and is what "clockwise" means.

use std::fmt;

use nightfall_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::catalog::{RoleId, Team};

/// Maximum number of foreign powers an actor can be configured with.
pub const MAX_BORROWED_POWERS: usize = 3;

/// Stable player identifier, unique within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier.
    pub id: PlayerId,
    /// Name shown to the moderator.
    pub display_name: String,
    /// Role dealt at setup.
    pub role: RoleId,
    /// Love-bond partner, if any.
    #[serde(default)]
    pub love_partner: Option<PlayerId>,
    /// Foreign roles an actor may borrow (empty for everyone else).
    #[serde(default)]
    pub borrowed_powers: Vec<RoleId>,
    /// Converted to the werewolves by infection. Role identity is unchanged.
    #[serde(default)]
    pub infected: bool,
}

impl Player {
    /// Creates a player with no bond, no borrowed powers and no infection.
    #[must_use]
    pub fn new(id: u32, display_name: impl Into<String>, role: RoleId) -> Self {
        Self {
            id: PlayerId(id),
            display_name: display_name.into(),
            role,
            love_partner: None,
            borrowed_powers: Vec::new(),
            infected: false,
        }
    }

    /// Effective team: infection overrides the role's team.
    #[must_use]
    pub fn team(&self) -> Team {
        if self.infected {
            Team::Werewolves
        } else {
            self.role.team()
        }
    }

    /// Whether the player currently plays with the werewolf collective.
    #[must_use]
    pub fn is_werewolf_aligned(&self) -> bool {
        self.team() == Team::Werewolves
    }
}

/// The validated set of players, in seat order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Player>", into = "Vec<Player>")]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Validates and wraps a roster.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if ids repeat, a love bond is not
    /// symmetric between exactly two existing players, or an actor has more
    /// than [`MAX_BORROWED_POWERS`] powers.
    pub fn new(players: Vec<Player>) -> Result<Self, DomainError> {
        for (index, player) in players.iter().enumerate() {
            if players[..index].iter().any(|p| p.id == player.id) {
                return Err(DomainError::Validation(format!(
                    "duplicate player id {}",
                    player.id
                )));
            }
            if player.borrowed_powers.len() > MAX_BORROWED_POWERS {
                return Err(DomainError::Validation(format!(
                    "{} has {} borrowed powers, at most {MAX_BORROWED_POWERS} allowed",
                    player.id,
                    player.borrowed_powers.len()
                )));
            }
            if let Some(partner_id) = player.love_partner {
                if partner_id == player.id {
                    return Err(DomainError::Validation(format!(
                        "{} cannot be bonded to themselves",
                        player.id
                    )));
                }
                let partner = players.iter().find(|p| p.id == partner_id);
                if partner.and_then(|p| p.love_partner) != Some(player.id) {
                    return Err(DomainError::Validation(format!(
                        "love bond between {} and {partner_id} is not symmetric",
                        player.id
                    )));
                }
            }
        }
        Ok(Self { players })
    }

    /// Players in seat order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Looks up a player.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Whether `id` is seated at this table.
    #[must_use]
    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// Love-bond partner of `id`.
    #[must_use]
    pub fn love_partner(&self, id: PlayerId) -> Option<PlayerId> {
        self.get(id).and_then(|p| p.love_partner)
    }

    /// Unordered love-bond pairs, lower id first.
    #[must_use]
    pub fn love_bonds(&self) -> Vec<(PlayerId, PlayerId)> {
        self.players
            .iter()
            .filter_map(|p| p.love_partner.map(|partner| (p.id, partner)))
            .filter(|(a, b)| a < b)
            .collect()
    }

    /// Players currently alive according to `ledgers`.
    pub fn living<'a>(&'a self, ledgers: &'a Ledgers) -> impl Iterator<Item = &'a Player> + 'a {
        self.players.iter().filter(|p| ledgers.is_alive(p.id))
    }

    /// Infected players.
    pub fn infected(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.infected)
    }

    /// First living player clockwise after `from` (wrapping) matching `pred`.
    /// `from` itself is never returned.
    #[must_use]
    pub fn next_clockwise(
        &self,
        from: PlayerId,
        ledgers: &Ledgers,
        pred: impl Fn(&Player) -> bool,
    ) -> Option<PlayerId> {
        let seat = self.players.iter().position(|p| p.id == from)?;
        let seats = self.players.len();
        (1..seats)
            .map(|offset| &self.players[(seat + offset) % seats])
            .find(|p| ledgers.is_alive(p.id) && pred(p))
            .map(|p| p.id)
    }

    /// Marks `id` as infected. Returns `false` if unknown or already infected.
    pub fn mark_infected(&mut self, id: PlayerId) -> bool {
        match self.players.iter_mut().find(|p| p.id == id) {
            Some(player) if !player.infected => {
                player.infected = true;
                true
            }
            _ => false,
        }
    }

    /// Clears every infection (used on restart).
    pub fn clear_infections(&mut self) {
        for player in &mut self.players {
            player.infected = false;
        }
    }
}

impl TryFrom<Vec<Player>> for Roster {
    type Error = DomainError;

    fn try_from(players: Vec<Player>) -> Result<Self, Self::Error> {
        Self::new(players)
    }
}

impl From<Roster> for Vec<Player> {
    fn from(roster: Roster) -> Self {
        roster.players
    }
}

/// Append-only death records. Their union is the set of dead players.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledgers {
    /// Night kills, in the order they were recorded.
    pub victims: Vec<PlayerId>,
    /// Day executions, in the order they were recorded.
    pub executed: Vec<PlayerId>,
}

impl Ledgers {
    /// Whether `id` appears in either ledger.
    #[must_use]
    pub fn is_dead(&self, id: PlayerId) -> bool {
        self.victims.contains(&id) || self.executed.contains(&id)
    }

    /// Whether `id` appears in neither ledger.
    #[must_use]
    pub fn is_alive(&self, id: PlayerId) -> bool {
        !self.is_dead(id)
    }

    /// Appends a night victim unless already dead. Returns whether it was added.
    pub fn record_victim(&mut self, id: PlayerId) -> bool {
        if self.is_dead(id) {
            return false;
        }
        self.victims.push(id);
        true
    }

    /// Appends an executed player unless already dead.
    pub fn record_executed(&mut self, id: PlayerId) -> bool {
        if self.is_dead(id) {
            return false;
        }
        self.executed.push(id);
        true
    }

    /// Administrative revival: removes `id` from both ledgers.
    pub fn revive(&mut self, id: PlayerId) -> bool {
        let before = self.victims.len() + self.executed.len();
        self.victims.retain(|&v| v != id);
        self.executed.retain(|&v| v != id);
        before != self.victims.len() + self.executed.len()
    }

    /// Empties both ledgers.
    pub fn clear(&mut self) {
        self.victims.clear();
        self.executed.clear();
    }
}
