//! Role catalog: static metadata per role and the wake-eligibility predicate.
//!
//! Roles form a closed, typed registry keyed by [`RoleId`]. Everything the
//! engine needs to know about a role (team, wake rule, default position in
//! the night, which action handler drives it) is read from
//! [`RoleId::definition`], never from comparisons on display names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Allegiance used by the win-condition evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Wins when every werewolf-aligned player is dead.
    Village,
    /// Wins when every non-werewolf player is dead.
    Werewolves,
    /// Wins alone.
    Solo,
}

/// Nights on which a role is woken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeRule {
    /// Never woken.
    Never,
    /// Woken every night.
    EveryNight,
    /// Woken on night 1 only.
    FirstNightOnly,
    /// Woken on nights 1, 1 + n, 1 + 2n, ...
    EveryNthNight(u32),
}

impl WakeRule {
    /// Returns whether this rule wakes its role on `night` (1-based).
    #[must_use]
    pub const fn wakes_on(self, night: u32) -> bool {
        match self {
            Self::Never => false,
            Self::EveryNight => true,
            Self::FirstNightOnly => night == 1,
            // A zero period is unsatisfiable; read it as `Never`.
            Self::EveryNthNight(0) => false,
            Self::EveryNthNight(n) => night >= 1 && (night - 1) % n == 0,
        }
    }
}

/// The closed set of night action procedures a role can be driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Woken for show; no action.
    Passive,
    /// Reveals one target's role.
    Seer,
    /// Save and kill potions.
    Witch,
    /// Shields one player from the werewolves.
    Protector,
    /// Chooses the night's victim, optionally infecting instead.
    WerewolfPack,
    /// Borrows one of the pre-configured foreign powers.
    Actor,
}

/// Immutable metadata for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Stable identifier.
    pub id: RoleId,
    /// Team the role plays for unless converted.
    pub team: Team,
    /// Nights on which the role wakes.
    pub wake_rule: WakeRule,
    /// Position in the canonical night order, if the role has its own slot.
    pub default_order: Option<u32>,
    /// Action procedure for the role's slot.
    pub handler: HandlerKind,
}

macro_rules! define_roles {
    (
        $(
            $variant:ident: $ident:literal => {
                team: $team:ident,
                wakes: $wake:expr,
                handler: $handler:ident
                $(, order: $order:literal)?
            }
        ),* $(,)?
    ) => {
        /// Stable role identifier. Serialized in kebab-case (`rusty-knight`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum RoleId {
            $(
                #[allow(missing_docs)]
                $variant,
            )*
        }

        impl RoleId {
            /// Every role in the catalog, in declaration order.
            pub const ALL: &'static [RoleId] = &[$(RoleId::$variant,)*];

            /// Returns the kebab-case identifier.
            #[must_use]
            pub const fn identifier(self) -> &'static str {
                match self {
                    $(RoleId::$variant => $ident,)*
                }
            }

            /// Returns the catalog entry for this role.
            #[must_use]
            pub const fn definition(self) -> RoleDefinition {
                match self {
                    $(RoleId::$variant => RoleDefinition {
                        id: RoleId::$variant,
                        team: Team::$team,
                        wake_rule: $wake,
                        default_order: define_roles!(@order $($order)?),
                        handler: HandlerKind::$handler,
                    },)*
                }
            }

            /// Parses an identifier; unknown identifiers yield `None`.
            #[must_use]
            pub fn parse(identifier: &str) -> Option<RoleId> {
                match identifier.trim().to_ascii_lowercase().as_str() {
                    $($ident => Some(RoleId::$variant),)*
                    _ => None,
                }
            }
        }
    };

    (@order $order:literal) => { Some($order) };
    (@order) => { None };
}

define_roles! {
    Villager: "villager" => { team: Village, wakes: WakeRule::Never, handler: Passive },
    Werewolf: "werewolf" => { team: Werewolves, wakes: WakeRule::EveryNight, handler: WerewolfPack, order: 6 },
    WolfFather: "wolf-father" => { team: Werewolves, wakes: WakeRule::EveryNight, handler: WerewolfPack },
    WhiteWolf: "white-wolf" => { team: Solo, wakes: WakeRule::EveryNthNight(2), handler: Passive, order: 7 },
    Seer: "seer" => { team: Village, wakes: WakeRule::EveryNight, handler: Seer, order: 4 },
    Witch: "witch" => { team: Village, wakes: WakeRule::EveryNight, handler: Witch, order: 8 },
    Protector: "protector" => { team: Village, wakes: WakeRule::EveryNight, handler: Protector, order: 5 },
    Hunter: "hunter" => { team: Village, wakes: WakeRule::Never, handler: Passive },
    Elder: "elder" => { team: Village, wakes: WakeRule::Never, handler: Passive },
    Cupid: "cupid" => { team: Village, wakes: WakeRule::FirstNightOnly, handler: Passive, order: 2 },
    RustyKnight: "rusty-knight" => { team: Village, wakes: WakeRule::Never, handler: Passive },
    FluteCharmer: "flute-charmer" => { team: Solo, wakes: WakeRule::EveryNight, handler: Passive, order: 9 },
    Actor: "actor" => { team: Village, wakes: WakeRule::EveryNight, handler: Actor, order: 3 },
    TwoSisters: "two-sisters" => { team: Village, wakes: WakeRule::EveryNthNight(2), handler: Passive, order: 1 },
}

impl RoleId {
    /// Team the role plays for before any conversion.
    #[must_use]
    pub const fn team(self) -> Team {
        self.definition().team
    }

    /// Whether the role itself sits with the werewolf collective.
    #[must_use]
    pub const fn is_werewolf_aligned(self) -> bool {
        matches!(self.team(), Team::Werewolves)
    }

    /// Whether an actor may borrow this role's power.
    #[must_use]
    pub const fn is_borrowable(self) -> bool {
        !self.is_werewolf_aligned()
            && !matches!(self.definition().handler, HandlerKind::Actor)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Whether `role` wakes on `night`. Pure: reads nothing but its arguments.
#[must_use]
pub const fn wake_rule_for(role: RoleId, night: u32) -> bool {
    role.definition().wake_rule.wakes_on(night)
}

/// Like [`wake_rule_for`], keyed by identifier. Unknown roles never wake.
#[must_use]
pub fn wake_rule_for_identifier(identifier: &str, night: u32) -> bool {
    RoleId::parse(identifier).is_some_and(|role| wake_rule_for(role, night))
}
