//! Single-use powers.
//!
//! Each power flips from unused to used exactly once per game. The night it
//! was consumed on is kept so that resolving that same night again reaches
//! the same decision instead of reading the power as already spent.

use serde::{Deserialize, Serialize};

/// Usage record of one single-use power.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUsage {
    /// Night the power was consumed on.
    pub used_on_night: Option<u32>,
}

impl PowerUsage {
    /// Whether the power has been consumed.
    #[must_use]
    pub const fn is_used(self) -> bool {
        self.used_on_night.is_some()
    }

    /// Whether the power can take effect during `night`.
    #[must_use]
    pub fn is_available_on(self, night: u32) -> bool {
        self.used_on_night.is_none_or(|used| used == night)
    }

    /// Consumes the power. Consuming a spent power is a no-op and returns
    /// `false`.
    pub fn consume(&mut self, night: u32) -> bool {
        if self.is_used() {
            return false;
        }
        self.used_on_night = Some(night);
        true
    }
}

/// Identifies one of the game's single-use powers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerKind {
    /// Werewolf conversion instead of a kill.
    Infection,
    /// The witch's healing potion.
    WitchSave,
    /// The witch's poison.
    WitchKill,
    /// The elder surviving the first werewolf attack.
    ElderSurvival,
}

/// All single-use powers of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinglePowers {
    /// Infection.
    pub infection: PowerUsage,
    /// Witch save potion.
    pub witch_save: PowerUsage,
    /// Witch kill potion.
    pub witch_kill: PowerUsage,
    /// Elder's survival.
    pub elder_survival: PowerUsage,
}

impl SinglePowers {
    /// Usage record for `kind`.
    #[must_use]
    pub const fn usage(&self, kind: PowerKind) -> PowerUsage {
        match kind {
            PowerKind::Infection => self.infection,
            PowerKind::WitchSave => self.witch_save,
            PowerKind::WitchKill => self.witch_kill,
            PowerKind::ElderSurvival => self.elder_survival,
        }
    }

    /// Consumes `kind` on `night`; see [`PowerUsage::consume`].
    pub fn consume(&mut self, kind: PowerKind, night: u32) -> bool {
        let usage = match kind {
            PowerKind::Infection => &mut self.infection,
            PowerKind::WitchSave => &mut self.witch_save,
            PowerKind::WitchKill => &mut self.witch_kill,
            PowerKind::ElderSurvival => &mut self.elder_survival,
        };
        usage.consume(night)
    }
}
