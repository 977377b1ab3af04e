//! Role action handlers.
//!
//! A handler turns one moderator selection for the active slot into
//! scratchpad writes. Handlers never touch the ledgers and never fail:
//! [`RoleHandler::validate`] is the boundary check callers run first, and
//! [`RoleHandler::stage`] quietly drops anything the prompt would not offer
//! (for instance a potion that is already spent).

use nightfall_core::error::DomainError;
use nightfall_roles::domain::catalog::{HandlerKind, RoleId};
use nightfall_roles::domain::roster::{Ledgers, PlayerId, Roster};
use nightfall_roles::domain::wake_order::{NightSlot, SlotKey};
use serde::{Deserialize, Serialize};

use super::powers::SinglePowers;
use super::scratchpad::{Revelation, Scratchpad};

/// The moderator's choice for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SlotSelection {
    /// No action. Always legal.
    Pass,
    /// Seer looks at `target`.
    Reveal {
        /// Player to reveal.
        target: PlayerId,
    },
    /// Protector shields `target`.
    Shield {
        /// Player to shield.
        target: PlayerId,
    },
    /// The collective attacks `target`, or infects it.
    Devour {
        /// Victim.
        target: PlayerId,
        /// Convert instead of kill.
        #[serde(default)]
        infect: bool,
    },
    /// Witch potions; either, both or neither.
    Potions {
        /// Heal tonight's werewolf victim.
        #[serde(default)]
        save: bool,
        /// Poison this player.
        #[serde(default)]
        kill: Option<PlayerId>,
    },
    /// Actor borrows `power` and acts with it.
    Borrow {
        /// Borrowed role.
        power: RoleId,
        /// Selection made with that role's handler.
        selection: Box<SlotSelection>,
    },
}

/// Read-only view of the game handed to a handler.
#[derive(Debug, Clone, Copy)]
pub struct NightContext<'a> {
    /// Current night (1-based).
    pub night: u32,
    /// Full roster.
    pub roster: &'a Roster,
    /// Death ledgers as of night start.
    pub ledgers: &'a Ledgers,
    /// Single-use power usage.
    pub powers: &'a SinglePowers,
    /// Player the protector shielded last night.
    pub previous_shield: Option<PlayerId>,
    /// Slot being played.
    pub slot: &'a NightSlot,
}

impl NightContext<'_> {
    /// A slot with no living member (possible with dead roles included) can
    /// only pass.
    fn slot_is_active(&self) -> bool {
        self.slot.members.iter().any(|&m| self.ledgers.is_alive(m))
    }

    fn living_except_members(&self) -> Vec<PlayerId> {
        self.roster
            .living(self.ledgers)
            .filter(|p| !self.slot.members.contains(&p.id))
            .map(|p| p.id)
            .collect()
    }
}

/// What the moderator may choose in the active slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    /// Handler driving the slot.
    pub handler: HandlerKind,
    /// Players that may be targeted.
    pub targets: Vec<PlayerId>,
    /// Tonight's werewolf victim, shown to the witch.
    pub staged_victim: Option<PlayerId>,
    /// Infection is still on offer.
    pub can_infect: bool,
    /// The save potion can be used on `staged_victim`.
    pub can_save: bool,
    /// The kill potion is still full.
    pub can_kill: bool,
    /// Powers the actor can borrow.
    pub powers: Vec<RoleId>,
}

impl Prompt {
    fn empty(handler: HandlerKind) -> Self {
        Self {
            handler,
            targets: Vec::new(),
            staged_victim: None,
            can_infect: false,
            can_save: false,
            can_kill: false,
            powers: Vec::new(),
        }
    }
}

/// Action procedure for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleHandler {
    /// No action.
    Passive,
    /// Reveal one role.
    Seer,
    /// Save and kill potions.
    Witch,
    /// One-night shield.
    Protector,
    /// Choose the victim.
    WerewolfPack,
    /// Borrow a foreign power.
    Actor {
        /// Borrowable powers configured for this actor.
        powers: Vec<RoleId>,
    },
}

impl RoleHandler {
    /// Creates the handler for `slot`. Actor powers come from the slot's
    /// representative; non-borrowable entries are dropped.
    #[must_use]
    pub fn for_slot(slot: &NightSlot, roster: &Roster) -> Self {
        match slot.key {
            SlotKey::WerewolfPack => Self::WerewolfPack,
            SlotKey::Role(role) => match role.definition().handler {
                HandlerKind::Actor => Self::Actor {
                    powers: roster
                        .get(slot.representative)
                        .map(|p| {
                            p.borrowed_powers
                                .iter()
                                .copied()
                                .filter(|r| r.is_borrowable())
                                .collect()
                        })
                        .unwrap_or_default(),
                },
                kind => Self::for_kind(kind),
            },
        }
    }

    fn for_kind(kind: HandlerKind) -> Self {
        match kind {
            HandlerKind::Passive => Self::Passive,
            HandlerKind::Seer => Self::Seer,
            HandlerKind::Witch => Self::Witch,
            HandlerKind::Protector => Self::Protector,
            HandlerKind::WerewolfPack => Self::WerewolfPack,
            HandlerKind::Actor => Self::Actor { powers: Vec::new() },
        }
    }

    /// The handler's kind.
    #[must_use]
    pub const fn kind(&self) -> HandlerKind {
        match self {
            Self::Passive => HandlerKind::Passive,
            Self::Seer => HandlerKind::Seer,
            Self::Witch => HandlerKind::Witch,
            Self::Protector => HandlerKind::Protector,
            Self::WerewolfPack => HandlerKind::WerewolfPack,
            Self::Actor { .. } => HandlerKind::Actor,
        }
    }

    /// Builds the prompt for the current state of the night.
    #[must_use]
    pub fn prompt(&self, ctx: &NightContext<'_>, pad: &Scratchpad) -> Prompt {
        let mut prompt = Prompt::empty(self.kind());
        if !ctx.slot_is_active() {
            return prompt;
        }
        match self {
            Self::Passive => {}
            Self::Seer => prompt.targets = ctx.living_except_members(),
            Self::Protector => {
                prompt.targets = ctx
                    .roster
                    .living(ctx.ledgers)
                    .map(|p| p.id)
                    .filter(|&id| Some(id) != ctx.previous_shield)
                    .collect();
            }
            Self::WerewolfPack => {
                prompt.targets = ctx
                    .roster
                    .living(ctx.ledgers)
                    .filter(|p| !p.is_werewolf_aligned())
                    .map(|p| p.id)
                    .collect();
                prompt.can_infect = ctx.powers.infection.is_available_on(ctx.night);
            }
            Self::Witch => {
                prompt.targets = ctx.living_except_members();
                prompt.staged_victim = pad.devoured;
                prompt.can_save =
                    pad.devoured.is_some() && ctx.powers.witch_save.is_available_on(ctx.night);
                prompt.can_kill = ctx.powers.witch_kill.is_available_on(ctx.night);
            }
            Self::Actor { powers } => prompt.powers.clone_from(powers),
        }
        prompt
    }

    /// Checks a selection against the prompt.
    ///
    /// Only targeting mistakes are rejected. Asking for a power that is
    /// already spent is accepted here and ignored by [`stage`](Self::stage).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the selection does not fit this
    /// handler or names a target the prompt does not offer.
    pub fn validate(
        &self,
        ctx: &NightContext<'_>,
        pad: &Scratchpad,
        selection: &SlotSelection,
    ) -> Result<(), DomainError> {
        if *selection == SlotSelection::Pass {
            return Ok(());
        }
        let prompt = self.prompt(ctx, pad);
        let check_target = |target: PlayerId| {
            if prompt.targets.contains(&target) {
                Ok(())
            } else {
                Err(DomainError::Validation(format!(
                    "{target} cannot be targeted by the {:?} slot",
                    self.kind()
                )))
            }
        };

        match (self, selection) {
            (Self::Seer, SlotSelection::Reveal { target })
            | (Self::Protector, SlotSelection::Shield { target })
            | (Self::WerewolfPack, SlotSelection::Devour { target, .. }) => check_target(*target),
            (Self::Witch, SlotSelection::Potions { kill, .. }) => match kill {
                Some(target) if prompt.can_kill => check_target(*target),
                _ => Ok(()),
            },
            (Self::Actor { powers }, SlotSelection::Borrow { power, selection }) => {
                if !powers.contains(power) {
                    return Err(DomainError::Validation(format!(
                        "the actor has no '{power}' power to borrow"
                    )));
                }
                Self::for_kind(power.definition().handler).validate(ctx, pad, selection)
            }
            _ => Err(DomainError::Validation(format!(
                "selection does not fit the {:?} slot",
                self.kind()
            ))),
        }
    }

    /// Writes the selection into the scratchpad.
    pub fn stage(&self, ctx: &NightContext<'_>, selection: &SlotSelection, pad: &mut Scratchpad) {
        let prompt = self.prompt(ctx, pad);
        match (self, selection) {
            (Self::Seer, SlotSelection::Reveal { target }) if prompt.targets.contains(target) => {
                if let Some(player) = ctx.roster.get(*target) {
                    pad.revealed.push(Revelation {
                        target: *target,
                        role: player.role,
                    });
                }
            }
            (Self::Protector, SlotSelection::Shield { target })
                if prompt.targets.contains(target) =>
            {
                pad.shielded = Some(*target);
            }
            (Self::WerewolfPack, SlotSelection::Devour { target, infect })
                if prompt.targets.contains(target) =>
            {
                pad.devoured = Some(*target);
                pad.infection_requested = *infect && prompt.can_infect;
            }
            (Self::Witch, SlotSelection::Potions { save, kill }) => {
                if *save && prompt.can_save {
                    pad.witch_save = prompt.staged_victim;
                }
                if let Some(target) = kill {
                    if prompt.can_kill && prompt.targets.contains(target) {
                        pad.witch_kill = Some(*target);
                    }
                }
            }
            (Self::Actor { powers }, SlotSelection::Borrow { power, selection })
                if powers.contains(power) =>
            {
                pad.borrowed = Some(*power);
                Self::for_kind(power.definition().handler).stage(ctx, selection, pad);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::powers::PowerKind;
    use nightfall_roles::domain::wake_order::{UNCONFIGURED_ORDER, WakeOrderConfig, resolve};
    use nightfall_test_support::RosterBuilder;

    fn slot_for(roster: &Roster, ledgers: &Ledgers, key: SlotKey) -> NightSlot {
        resolve(roster, ledgers, &WakeOrderConfig::canonical(), 1, true)
            .into_iter()
            .find(|s| s.key == key)
            .unwrap()
    }

    fn table() -> Roster {
        RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Seer)
            .player(3, RoleId::Witch)
            .player(4, RoleId::Protector)
            .player(5, RoleId::Villager)
            .actor(6, &[RoleId::Seer, RoleId::Werewolf, RoleId::Protector])
            .build()
    }

    #[test]
    fn test_pack_targets_exclude_werewolves_and_dead() {
        let roster = table();
        let mut ledgers = Ledgers::default();
        ledgers.record_victim(PlayerId(5));
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::WerewolfPack);
        let ctx = NightContext {
            night: 2,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };

        let prompt = RoleHandler::WerewolfPack.prompt(&ctx, &Scratchpad::default());

        assert_eq!(
            prompt.targets,
            vec![PlayerId(2), PlayerId(3), PlayerId(4), PlayerId(6)]
        );
        assert!(prompt.can_infect);
    }

    #[test]
    fn test_devour_stages_victim_and_infection() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::WerewolfPack);
        let ctx = NightContext {
            night: 1,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };
        let mut pad = Scratchpad::default();
        let selection = SlotSelection::Devour {
            target: PlayerId(4),
            infect: true,
        };

        RoleHandler::WerewolfPack
            .validate(&ctx, &pad, &selection)
            .unwrap();
        RoleHandler::WerewolfPack.stage(&ctx, &selection, &mut pad);

        assert_eq!(pad.devoured, Some(PlayerId(4)));
        assert!(pad.infection_requested);
    }

    #[test]
    fn test_spent_infection_request_is_silently_dropped() {
        let roster = table();
        let ledgers = Ledgers::default();
        let mut powers = SinglePowers::default();
        powers.consume(PowerKind::Infection, 1);
        let slot = slot_for(&roster, &ledgers, SlotKey::WerewolfPack);
        let ctx = NightContext {
            night: 2,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };
        let mut pad = Scratchpad::default();
        let selection = SlotSelection::Devour {
            target: PlayerId(5),
            infect: true,
        };

        assert!(RoleHandler::WerewolfPack.validate(&ctx, &pad, &selection).is_ok());
        RoleHandler::WerewolfPack.stage(&ctx, &selection, &mut pad);

        assert_eq!(pad.devoured, Some(PlayerId(5)));
        assert!(!pad.infection_requested);
    }

    #[test]
    fn test_pack_cannot_target_a_werewolf() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::WerewolfPack);
        let ctx = NightContext {
            night: 1,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };

        let result = RoleHandler::WerewolfPack.validate(
            &ctx,
            &Scratchpad::default(),
            &SlotSelection::Devour {
                target: PlayerId(1),
                infect: false,
            },
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_protector_cannot_repeat_last_nights_target() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::Role(RoleId::Protector));
        let ctx = NightContext {
            night: 3,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: Some(PlayerId(3)),
            slot: &slot,
        };

        let prompt = RoleHandler::Protector.prompt(&ctx, &Scratchpad::default());

        assert!(!prompt.targets.contains(&PlayerId(3)));
        assert!(prompt.targets.contains(&PlayerId(4)));
        assert!(
            RoleHandler::Protector
                .validate(
                    &ctx,
                    &Scratchpad::default(),
                    &SlotSelection::Shield {
                        target: PlayerId(3)
                    }
                )
                .is_err()
        );
    }

    #[test]
    fn test_witch_save_requires_a_staged_victim() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::Role(RoleId::Witch));
        let ctx = NightContext {
            night: 1,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };
        let selection = SlotSelection::Potions {
            save: true,
            kill: Some(PlayerId(1)),
        };

        let mut empty_night = Scratchpad::default();
        RoleHandler::Witch.stage(&ctx, &selection, &mut empty_night);
        assert_eq!(empty_night.witch_save, None);
        assert_eq!(empty_night.witch_kill, Some(PlayerId(1)));

        let mut pad = Scratchpad {
            devoured: Some(PlayerId(5)),
            ..Scratchpad::default()
        };
        RoleHandler::Witch.stage(&ctx, &selection, &mut pad);
        assert_eq!(pad.witch_save, Some(PlayerId(5)));
    }

    #[test]
    fn test_witch_cannot_poison_herself() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::Role(RoleId::Witch));
        let ctx = NightContext {
            night: 1,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };

        let result = RoleHandler::Witch.validate(
            &ctx,
            &Scratchpad::default(),
            &SlotSelection::Potions {
                save: false,
                kill: Some(PlayerId(3)),
            },
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_seer_reveal_records_role() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::Role(RoleId::Seer));
        let ctx = NightContext {
            night: 1,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };
        let mut pad = Scratchpad::default();

        RoleHandler::Seer.stage(
            &ctx,
            &SlotSelection::Reveal {
                target: PlayerId(1),
            },
            &mut pad,
        );

        assert_eq!(
            pad.revealed,
            vec![Revelation {
                target: PlayerId(1),
                role: RoleId::Werewolf
            }]
        );
    }

    #[test]
    fn test_actor_delegates_to_borrowed_power() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::Role(RoleId::Actor));
        let handler = RoleHandler::for_slot(&slot, &roster);
        let ctx = NightContext {
            night: 1,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };
        let selection = SlotSelection::Borrow {
            power: RoleId::Protector,
            selection: Box::new(SlotSelection::Shield {
                target: PlayerId(2),
            }),
        };
        let mut pad = Scratchpad::default();

        assert_eq!(
            handler,
            RoleHandler::Actor {
                powers: vec![RoleId::Seer, RoleId::Protector]
            }
        );
        handler.validate(&ctx, &pad, &selection).unwrap();
        handler.stage(&ctx, &selection, &mut pad);

        assert_eq!(pad.borrowed, Some(RoleId::Protector));
        assert_eq!(pad.shielded, Some(PlayerId(2)));
    }

    #[test]
    fn test_actor_cannot_borrow_unconfigured_power() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::Role(RoleId::Actor));
        let handler = RoleHandler::for_slot(&slot, &roster);
        let ctx = NightContext {
            night: 1,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };

        let result = handler.validate(
            &ctx,
            &Scratchpad::default(),
            &SlotSelection::Borrow {
                power: RoleId::Werewolf,
                selection: Box::new(SlotSelection::Pass),
            },
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_slot_without_living_member_offers_nothing() {
        let roster = table();
        let mut ledgers = Ledgers::default();
        ledgers.record_victim(PlayerId(2));
        let powers = SinglePowers::default();
        let slot = NightSlot {
            key: SlotKey::Role(RoleId::Seer),
            representative: PlayerId(2),
            members: vec![PlayerId(2)],
            order: UNCONFIGURED_ORDER,
        };
        let ctx = NightContext {
            night: 2,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };

        let prompt = RoleHandler::Seer.prompt(&ctx, &Scratchpad::default());

        assert!(prompt.targets.is_empty());
        assert!(
            RoleHandler::Seer
                .validate(&ctx, &Scratchpad::default(), &SlotSelection::Pass)
                .is_ok()
        );
    }

    #[test]
    fn test_mismatched_selection_is_rejected() {
        let roster = table();
        let ledgers = Ledgers::default();
        let powers = SinglePowers::default();
        let slot = slot_for(&roster, &ledgers, SlotKey::Role(RoleId::Seer));
        let ctx = NightContext {
            night: 1,
            roster: &roster,
            ledgers: &ledgers,
            powers: &powers,
            previous_shield: None,
            slot: &slot,
        };

        let result = RoleHandler::Seer.validate(
            &ctx,
            &Scratchpad::default(),
            &SlotSelection::Shield {
                target: PlayerId(5),
            },
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_selection_wire_format() {
        let selection: SlotSelection = serde_json::from_value(serde_json::json!({
            "action": "devour",
            "target": 3
        }))
        .unwrap();

        assert_eq!(
            selection,
            SlotSelection::Devour {
                target: PlayerId(3),
                infect: false
            }
        );
    }
}
