//! Night resolution pipeline.
//!
//! [`resolve_night`] reduces the scratchpad, the ledgers and the deferred
//! effects carried over from the previous night into a [`NightOutcome`]. It
//! is pure: the caller commits the outcome with [`NightOutcome::commit`].
//!
//! Order of evaluation:
//! 1. deferred vengeance from the previous night, with heartbreak;
//! 2. the werewolf victim, first match wins: infection, shield, witch save,
//!    elder survival, otherwise death;
//! 3. the witch's poison, unconditionally;
//! 4. heartbreak for everyone who died in steps 2–3;
//! 5. rusty-knight vengeance scheduling and hunter retaliation flagging.
//!
//! Resolving the same night twice adds nothing: ledgers are append-only and
//! a power consumed tonight still reads as available tonight.

use nightfall_roles::domain::catalog::RoleId;
use nightfall_roles::domain::roster::{Ledgers, PlayerId, Roster};
use serde::{Deserialize, Serialize};

use super::powers::{PowerKind, SinglePowers};
use super::scratchpad::Scratchpad;

/// Why a player died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Killed by the werewolf collective.
    Werewolves,
    /// Poisoned by the witch.
    Potion,
    /// Died with their love-bond partner.
    Heartbreak,
    /// Struck by the rusty knight's delayed vengeance.
    Vengeance,
    /// Shot by the hunter.
    Hunter,
    /// Executed by the village.
    Execution,
}

/// One death produced by a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Death {
    /// Who died.
    pub player: PlayerId,
    /// How.
    pub cause: DeathCause,
}

/// An effect scheduled for a later night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeferredEffect {
    /// The knight's rusty sword kills `target` at the start of next night.
    Vengeance {
        /// The knight who died.
        knight: PlayerId,
        /// The werewolf who will die.
        target: PlayerId,
    },
}

/// Why the werewolf victim survived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReprieveReason {
    /// Converted to the werewolves instead.
    Infected,
    /// Shielded by the protector.
    Shielded,
    /// Healed by the witch.
    Healed,
    /// The elder shrugged off the first attack.
    ElderSurvived,
}

/// The werewolf victim who did not die, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reprieve {
    /// The intended victim.
    pub player: PlayerId,
    /// The rule that spared them.
    pub reason: ReprieveReason,
}

/// Everything the pipeline needs for one night.
#[derive(Debug, Clone, Copy)]
pub struct NightInput<'a> {
    /// Night being resolved.
    pub night: u32,
    /// Roster as of night start.
    pub roster: &'a Roster,
    /// Ledgers as of night start.
    pub ledgers: &'a Ledgers,
    /// Single-use power usage.
    pub powers: &'a SinglePowers,
    /// Tonight's selections.
    pub scratchpad: &'a Scratchpad,
    /// Effects scheduled by earlier nights.
    pub deferred: &'a [DeferredEffect],
}

/// Result of resolving one night.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightOutcome {
    /// New deaths, in the order they happened. Never holds a player already
    /// in a ledger or tonight's infected player.
    pub deaths: Vec<Death>,
    /// Player converted to the werewolves tonight.
    pub infected: Option<PlayerId>,
    /// Werewolf victim who survived.
    pub reprieve: Option<Reprieve>,
    /// Powers flipped from unused to used.
    pub consumed: Vec<PowerKind>,
    /// Deferred effects carried in and applied.
    pub applied: Vec<DeferredEffect>,
    /// Deferred effects scheduled for the next night.
    pub scheduled: Vec<DeferredEffect>,
    /// Hunter who must now pick a retaliation target.
    pub hunter_pending: Option<PlayerId>,
}

impl NightOutcome {
    /// Ids of tonight's dead.
    #[must_use]
    pub fn victims(&self) -> Vec<PlayerId> {
        self.deaths.iter().map(|d| d.player).collect()
    }

    /// Writes the outcome into the session state: deaths to `victims`,
    /// infection to the roster, consumed powers to `powers`.
    pub fn commit(
        &self,
        night: u32,
        roster: &mut Roster,
        ledgers: &mut Ledgers,
        powers: &mut SinglePowers,
    ) {
        if let Some(infected) = self.infected {
            roster.mark_infected(infected);
        }
        for death in &self.deaths {
            ledgers.record_victim(death.player);
        }
        for &kind in &self.consumed {
            powers.consume(kind, night);
        }
    }
}

/// Tracks who has died during one resolution pass.
struct Pass<'a> {
    roster: &'a Roster,
    ledgers: &'a Ledgers,
    deaths: Vec<Death>,
    exempt: Option<PlayerId>,
}

impl<'a> Pass<'a> {
    fn new(roster: &'a Roster, ledgers: &'a Ledgers) -> Self {
        Self {
            roster,
            ledgers,
            deaths: Vec::new(),
            exempt: None,
        }
    }

    fn is_alive(&self, id: PlayerId) -> bool {
        self.ledgers.is_alive(id) && !self.deaths.iter().any(|d| d.player == id)
    }

    fn kill(&mut self, id: PlayerId, cause: DeathCause) {
        if Some(id) == self.exempt || !self.roster.contains(id) || !self.is_alive(id) {
            return;
        }
        self.deaths.push(Death { player: id, cause });
    }

    /// Kills the living partner of everyone who died so far. Bonds hold
    /// exactly two players, so one sweep over the growing list terminates.
    fn heartbreak(&mut self) {
        let mut index = 0;
        while index < self.deaths.len() {
            if let Some(partner) = self.roster.love_partner(self.deaths[index].player) {
                self.kill(partner, DeathCause::Heartbreak);
            }
            index += 1;
        }
    }
}

fn consume(outcome: &mut NightOutcome, powers: &SinglePowers, kind: PowerKind) {
    if !powers.usage(kind).is_used() && !outcome.consumed.contains(&kind) {
        outcome.consumed.push(kind);
    }
}

/// Resolves one night.
#[must_use]
pub fn resolve_night(input: &NightInput<'_>) -> NightOutcome {
    let NightInput {
        night,
        roster,
        ledgers,
        powers,
        scratchpad: pad,
        deferred,
    } = *input;
    let mut outcome = NightOutcome::default();
    let mut pass = Pass::new(roster, ledgers);

    for effect in deferred {
        match *effect {
            DeferredEffect::Vengeance { target, .. } => pass.kill(target, DeathCause::Vengeance),
        }
        outcome.applied.push(*effect);
    }
    pass.heartbreak();
    let carried_over = pass.deaths.len();

    if let Some(target) = pad.devoured.filter(|&t| pass.is_alive(t)) {
        let is_elder = roster.get(target).is_some_and(|p| p.role == RoleId::Elder);
        let reason = if pad.infection_requested && powers.infection.is_available_on(night) {
            Some(ReprieveReason::Infected)
        } else if pad.shielded == Some(target) {
            Some(ReprieveReason::Shielded)
        } else if pad.witch_save == Some(target) && powers.witch_save.is_available_on(night) {
            Some(ReprieveReason::Healed)
        } else if is_elder && powers.elder_survival.is_available_on(night) {
            Some(ReprieveReason::ElderSurvived)
        } else {
            None
        };

        match reason {
            Some(ReprieveReason::Infected) => {
                outcome.infected = Some(target);
                pass.exempt = Some(target);
                consume(&mut outcome, powers, PowerKind::Infection);
            }
            Some(ReprieveReason::ElderSurvived) => {
                consume(&mut outcome, powers, PowerKind::ElderSurvival);
            }
            Some(ReprieveReason::Shielded | ReprieveReason::Healed) => {}
            None => pass.kill(target, DeathCause::Werewolves),
        }
        outcome.reprieve = reason.map(|reason| Reprieve {
            player: target,
            reason,
        });
    }

    if pad.witch_save.is_some() && powers.witch_save.is_available_on(night) {
        consume(&mut outcome, powers, PowerKind::WitchSave);
    }

    if let Some(target) = pad.witch_kill {
        if powers.witch_kill.is_available_on(night) {
            consume(&mut outcome, powers, PowerKind::WitchKill);
            pass.kill(target, DeathCause::Potion);
        }
    }

    pass.heartbreak();

    let tonight = &pass.deaths[carried_over..];
    outcome.scheduled = schedule_vengeance(roster, ledgers, &pass.deaths, outcome.infected, tonight);
    outcome.hunter_pending = tonight
        .iter()
        .find(|d| {
            matches!(d.cause, DeathCause::Werewolves | DeathCause::Potion)
                && roster.get(d.player).is_some_and(|p| p.role == RoleId::Hunter)
        })
        .map(|d| d.player);

    outcome.deaths = pass.deaths;
    outcome
}

/// A rusty knight killed by the werewolves takes the next living werewolf
/// clockwise with them, one night later.
fn schedule_vengeance(
    roster: &Roster,
    ledgers: &Ledgers,
    all_deaths: &[Death],
    infected: Option<PlayerId>,
    tonight: &[Death],
) -> Vec<DeferredEffect> {
    let knights: Vec<PlayerId> = tonight
        .iter()
        .filter(|d| d.cause == DeathCause::Werewolves)
        .filter(|d| roster.get(d.player).is_some_and(|p| p.role == RoleId::RustyKnight))
        .map(|d| d.player)
        .collect();
    if knights.is_empty() {
        return Vec::new();
    }

    let mut after = ledgers.clone();
    for death in all_deaths {
        after.record_victim(death.player);
    }
    let mut converted = roster.clone();
    if let Some(id) = infected {
        converted.mark_infected(id);
    }

    knights
        .into_iter()
        .filter_map(|knight| {
            converted
                .next_clockwise(knight, &after, |p| p.is_werewolf_aligned())
                .map(|target| DeferredEffect::Vengeance { knight, target })
        })
        .collect()
}

/// Runs heartbreak over deaths decided outside the night (executions, the
/// hunter's shot). Already-dead players in `initial` are dropped.
#[must_use]
pub fn heartbreak_pass(roster: &Roster, ledgers: &Ledgers, initial: &[Death]) -> Vec<Death> {
    let mut pass = Pass::new(roster, ledgers);
    for death in initial {
        pass.kill(death.player, death.cause);
    }
    pass.heartbreak();
    pass.deaths
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightfall_test_support::RosterBuilder;

    struct Night {
        roster: Roster,
        ledgers: Ledgers,
        powers: SinglePowers,
    }

    impl Night {
        fn new(roster: Roster) -> Self {
            Self {
                roster,
                ledgers: Ledgers::default(),
                powers: SinglePowers::default(),
            }
        }

        fn resolve(&self, night: u32, pad: &Scratchpad, deferred: &[DeferredEffect]) -> NightOutcome {
            resolve_night(&NightInput {
                night,
                roster: &self.roster,
                ledgers: &self.ledgers,
                powers: &self.powers,
                scratchpad: pad,
                deferred,
            })
        }

        fn commit(&mut self, night: u32, outcome: &NightOutcome) {
            outcome.commit(night, &mut self.roster, &mut self.ledgers, &mut self.powers);
        }
    }

    fn five_players() -> Roster {
        RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Villager)
            .player(3, RoleId::Villager)
            .player(4, RoleId::Villager)
            .player(5, RoleId::Villager)
            .build()
    }

    fn devour(target: u32) -> Scratchpad {
        Scratchpad {
            devoured: Some(PlayerId(target)),
            ..Scratchpad::default()
        }
    }

    #[test]
    fn test_basic_kill_adds_victim() {
        let mut night = Night::new(five_players());

        let outcome = night.resolve(1, &devour(3), &[]);
        night.commit(1, &outcome);

        assert_eq!(outcome.victims(), vec![PlayerId(3)]);
        assert_eq!(night.ledgers.victims, vec![PlayerId(3)]);
        assert!(night.ledgers.executed.is_empty());
    }

    #[test]
    fn test_empty_scratchpad_kills_nobody() {
        let night = Night::new(five_players());

        let outcome = night.resolve(1, &Scratchpad::default(), &[]);

        assert!(outcome.deaths.is_empty());
        assert!(outcome.consumed.is_empty());
    }

    #[test]
    fn test_shield_nullifies_kill() {
        let night = Night::new(five_players());
        let pad = Scratchpad {
            shielded: Some(PlayerId(3)),
            ..devour(3)
        };

        let outcome = night.resolve(2, &pad, &[]);

        assert!(outcome.deaths.is_empty());
        assert_eq!(
            outcome.reprieve,
            Some(Reprieve {
                player: PlayerId(3),
                reason: ReprieveReason::Shielded
            })
        );
    }

    #[test]
    fn test_shield_takes_precedence_over_witch_save_but_potion_is_spent() {
        let night = Night::new(five_players());
        let pad = Scratchpad {
            shielded: Some(PlayerId(3)),
            witch_save: Some(PlayerId(3)),
            ..devour(3)
        };

        let outcome = night.resolve(1, &pad, &[]);

        assert_eq!(outcome.reprieve.unwrap().reason, ReprieveReason::Shielded);
        assert_eq!(outcome.consumed, vec![PowerKind::WitchSave]);
    }

    #[test]
    fn test_infection_converts_instead_of_killing() {
        let mut night = Night::new(five_players());
        let pad = Scratchpad {
            infection_requested: true,
            ..devour(4)
        };

        let outcome = night.resolve(1, &pad, &[]);
        night.commit(1, &outcome);

        assert!(outcome.deaths.is_empty());
        assert_eq!(outcome.infected, Some(PlayerId(4)));
        assert!(night.roster.get(PlayerId(4)).unwrap().is_werewolf_aligned());
        assert_eq!(night.powers.infection.used_on_night, Some(1));
    }

    #[test]
    fn test_infected_player_is_never_a_victim_that_night() {
        let night = Night::new(five_players());
        let pad = Scratchpad {
            infection_requested: true,
            witch_kill: Some(PlayerId(4)),
            ..devour(4)
        };

        let outcome = night.resolve(1, &pad, &[]);

        assert!(!outcome.victims().contains(&PlayerId(4)));
        assert_eq!(outcome.consumed, vec![PowerKind::Infection, PowerKind::WitchKill]);
    }

    #[test]
    fn test_spent_infection_falls_through_to_death() {
        let mut night = Night::new(five_players());
        night.powers.consume(PowerKind::Infection, 1);
        let pad = Scratchpad {
            infection_requested: true,
            ..devour(2)
        };

        let outcome = night.resolve(2, &pad, &[]);

        assert_eq!(outcome.victims(), vec![PlayerId(2)]);
        assert!(outcome.consumed.is_empty());
    }

    #[test]
    fn test_witch_save_heals_victim() {
        let night = Night::new(five_players());
        let pad = Scratchpad {
            witch_save: Some(PlayerId(2)),
            ..devour(2)
        };

        let outcome = night.resolve(1, &pad, &[]);

        assert!(outcome.deaths.is_empty());
        assert_eq!(outcome.reprieve.unwrap().reason, ReprieveReason::Healed);
    }

    #[test]
    fn test_elder_survives_first_attack_only() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Elder)
            .player(3, RoleId::Villager)
            .build();
        let mut night = Night::new(roster);

        let first = night.resolve(1, &devour(2), &[]);
        night.commit(1, &first);
        let second = night.resolve(2, &devour(2), &[]);

        assert!(first.deaths.is_empty());
        assert_eq!(first.consumed, vec![PowerKind::ElderSurvival]);
        assert_eq!(second.victims(), vec![PlayerId(2)]);
    }

    #[test]
    fn test_witch_kill_bypasses_protection() {
        let night = Night::new(five_players());
        let pad = Scratchpad {
            shielded: Some(PlayerId(5)),
            witch_kill: Some(PlayerId(5)),
            ..Scratchpad::default()
        };

        let outcome = night.resolve(1, &pad, &[]);

        assert_eq!(
            outcome.deaths,
            vec![Death {
                player: PlayerId(5),
                cause: DeathCause::Potion
            }]
        );
    }

    #[test]
    fn test_lover_dies_of_heartbreak_in_same_pass() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Villager)
            .player(3, RoleId::Villager)
            .player(5, RoleId::Seer)
            .bond(2, 5)
            .build();
        let night = Night::new(roster);

        let outcome = night.resolve(1, &devour(2), &[]);

        assert_eq!(
            outcome.deaths,
            vec![
                Death {
                    player: PlayerId(2),
                    cause: DeathCause::Werewolves
                },
                Death {
                    player: PlayerId(5),
                    cause: DeathCause::Heartbreak
                },
            ]
        );
    }

    #[test]
    fn test_rerunning_a_resolved_night_adds_nothing() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Elder)
            .player(3, RoleId::Villager)
            .player(4, RoleId::Villager)
            .player(5, RoleId::Villager)
            .bond(4, 5)
            .build();
        let mut night = Night::new(roster);
        let pad = Scratchpad {
            witch_kill: Some(PlayerId(4)),
            ..devour(2)
        };

        let first = night.resolve(1, &pad, &[]);
        night.commit(1, &first);
        let second = night.resolve(1, &pad, &[]);

        assert_eq!(first.victims(), vec![PlayerId(4), PlayerId(5)]);
        assert!(second.deaths.is_empty());
        assert!(second.consumed.is_empty());
        assert_eq!(second.reprieve, first.reprieve);
    }

    #[test]
    fn test_rerunning_an_infection_night_adds_nothing() {
        let mut night = Night::new(five_players());
        let pad = Scratchpad {
            infection_requested: true,
            ..devour(3)
        };

        let first = night.resolve(1, &pad, &[]);
        night.commit(1, &first);
        let second = night.resolve(1, &pad, &[]);
        night.commit(1, &second);

        assert!(second.deaths.is_empty());
        assert!(second.consumed.is_empty());
        assert_eq!(night.powers.infection.used_on_night, Some(1));
    }

    #[test]
    fn test_knight_killed_by_werewolves_schedules_vengeance() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Villager)
            .player(3, RoleId::RustyKnight)
            .player(4, RoleId::Villager)
            .player(5, RoleId::Werewolf)
            .build();
        let mut night = Night::new(roster);

        let first = night.resolve(1, &devour(3), &[]);
        night.commit(1, &first);

        assert_eq!(
            first.scheduled,
            vec![DeferredEffect::Vengeance {
                knight: PlayerId(3),
                target: PlayerId(5)
            }]
        );

        let second = night.resolve(2, &devour(2), &first.scheduled);

        assert_eq!(
            second.deaths,
            vec![
                Death {
                    player: PlayerId(5),
                    cause: DeathCause::Vengeance
                },
                Death {
                    player: PlayerId(2),
                    cause: DeathCause::Werewolves
                },
            ]
        );
        assert_eq!(second.applied, first.scheduled);
        assert!(second.scheduled.is_empty());
    }

    #[test]
    fn test_vengeance_wraps_around_the_table() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Villager)
            .player(3, RoleId::RustyKnight)
            .build();
        let night = Night::new(roster);

        let outcome = night.resolve(1, &devour(3), &[]);

        assert_eq!(
            outcome.scheduled,
            vec![DeferredEffect::Vengeance {
                knight: PlayerId(3),
                target: PlayerId(1)
            }]
        );
    }

    #[test]
    fn test_poisoned_knight_does_not_schedule_vengeance() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(3, RoleId::RustyKnight)
            .build();
        let night = Night::new(roster);
        let pad = Scratchpad {
            witch_kill: Some(PlayerId(3)),
            ..Scratchpad::default()
        };

        let outcome = night.resolve(1, &pad, &[]);

        assert_eq!(outcome.victims(), vec![PlayerId(3)]);
        assert!(outcome.scheduled.is_empty());
    }

    #[test]
    fn test_vengeance_skips_target_already_dead() {
        let mut night = Night::new(five_players());
        night.ledgers.record_executed(PlayerId(1));
        let deferred = [DeferredEffect::Vengeance {
            knight: PlayerId(3),
            target: PlayerId(1),
        }];

        let outcome = night.resolve(2, &Scratchpad::default(), &deferred);

        assert!(outcome.deaths.is_empty());
        assert_eq!(outcome.applied, deferred.to_vec());
    }

    #[test]
    fn test_hunter_death_flags_retaliation() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Hunter)
            .player(3, RoleId::Villager)
            .build();
        let night = Night::new(roster);

        let by_wolves = night.resolve(1, &devour(2), &[]);
        let by_potion = night.resolve(
            1,
            &Scratchpad {
                witch_kill: Some(PlayerId(2)),
                ..Scratchpad::default()
            },
            &[],
        );

        assert_eq!(by_wolves.hunter_pending, Some(PlayerId(2)));
        assert_eq!(by_potion.hunter_pending, Some(PlayerId(2)));
    }

    #[test]
    fn test_hunter_dying_of_heartbreak_does_not_shoot() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Hunter)
            .player(3, RoleId::Villager)
            .bond(2, 3)
            .build();
        let night = Night::new(roster);

        let outcome = night.resolve(1, &devour(3), &[]);

        assert_eq!(outcome.victims(), vec![PlayerId(3), PlayerId(2)]);
        assert_eq!(outcome.hunter_pending, None);
    }

    #[test]
    fn test_vengeance_and_hunter_can_be_pending_together() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::RustyKnight)
            .player(3, RoleId::Hunter)
            .player(4, RoleId::Villager)
            .build();
        let night = Night::new(roster);
        let pad = Scratchpad {
            witch_kill: Some(PlayerId(3)),
            ..devour(2)
        };

        let outcome = night.resolve(1, &pad, &[]);

        assert_eq!(outcome.hunter_pending, Some(PlayerId(3)));
        assert_eq!(
            outcome.scheduled,
            vec![DeferredEffect::Vengeance {
                knight: PlayerId(2),
                target: PlayerId(1)
            }]
        );
    }

    #[test]
    fn test_heartbreak_pass_for_execution() {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Villager)
            .player(5, RoleId::Villager)
            .bond(2, 5)
            .build();

        let deaths = heartbreak_pass(
            &roster,
            &Ledgers::default(),
            &[Death {
                player: PlayerId(2),
                cause: DeathCause::Execution,
            }],
        );

        assert_eq!(
            deaths.iter().map(|d| d.player).collect::<Vec<_>>(),
            vec![PlayerId(2), PlayerId(5)]
        );
        assert_eq!(deaths[1].cause, DeathCause::Heartbreak);
    }
}
