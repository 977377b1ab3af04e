//! Wake-order resolver.
//!
//! Turns the roster, the variant's order configuration and the night number
//! into the ordered list of slots the moderator walks through.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::{RoleId, wake_rule_for};
use super::roster::{Ledgers, Player, PlayerId, Roster};

/// Rank given to slots whose key is absent from the configuration.
pub const UNCONFIGURED_ORDER: u32 = u32::MAX;

/// Identifier accepted in configuration for the werewolf collective.
pub const WEREWOLF_PACK_IDENTIFIER: &str = "werewolves";

/// Grouping key of a slot. Every werewolf-aligned player, converts
/// included, shares [`SlotKey::WerewolfPack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    /// The werewolf collective.
    WerewolfPack,
    /// Any other role, keyed by identifier.
    Role(RoleId),
}

impl SlotKey {
    /// Key under which `player` wakes.
    #[must_use]
    pub fn for_player(player: &Player) -> Self {
        if player.is_werewolf_aligned() {
            Self::WerewolfPack
        } else {
            Self::Role(player.role)
        }
    }

    /// Key for a configured role name. Any werewolf-aligned role name, or
    /// `werewolves`, designates the collective.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case(WEREWOLF_PACK_IDENTIFIER) {
            return Some(Self::WerewolfPack);
        }
        RoleId::parse(name).map(|role| {
            if role.is_werewolf_aligned() {
                Self::WerewolfPack
            } else {
                Self::Role(role)
            }
        })
    }

    /// Whether this key wakes on `night`. The collective follows the
    /// werewolf's rule so that converts wake with it whatever their role.
    #[must_use]
    pub fn wakes_on(self, night: u32) -> bool {
        match self {
            Self::WerewolfPack => wake_rule_for(RoleId::Werewolf, night),
            Self::Role(role) => wake_rule_for(role, night),
        }
    }
}

/// One `{roleName, order}` row of a variant's wake-order configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeOrderEntry {
    /// Role identifier, or `werewolves` for the collective.
    pub role_name: String,
    /// 1-based position; lower wakes first.
    pub order: i64,
}

/// A resolved order rank for one slot key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOrder {
    /// The slot key.
    pub key: SlotKey,
    /// Its rank.
    pub order: u32,
}

/// Validated wake-order configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeOrderConfig {
    orders: Vec<SlotOrder>,
}

impl WakeOrderConfig {
    /// Canonical nine-slot order derived from the catalog's default hints.
    #[must_use]
    pub fn canonical() -> Self {
        let mut orders: Vec<SlotOrder> = Vec::new();
        for &role in RoleId::ALL {
            let Some(order) = role.definition().default_order else {
                continue;
            };
            let key = if role.is_werewolf_aligned() {
                SlotKey::WerewolfPack
            } else {
                SlotKey::Role(role)
            };
            if !orders.iter().any(|o| o.key == key) {
                orders.push(SlotOrder { key, order });
            }
        }
        orders.sort_by_key(|o| o.order);
        Self { orders }
    }

    /// Builds a configuration from raw rows. Rows naming unknown roles or
    /// carrying a non-positive order are skipped; the first row for a key
    /// wins. Returns `None` when nothing usable remains.
    #[must_use]
    pub fn from_entries(entries: &[WakeOrderEntry]) -> Option<Self> {
        let mut orders: Vec<SlotOrder> = Vec::new();
        for entry in entries {
            let Some(key) = SlotKey::parse(&entry.role_name) else {
                warn!(role_name = %entry.role_name, "ignoring wake order for unknown role");
                continue;
            };
            let Ok(order) = u32::try_from(entry.order) else {
                warn!(role_name = %entry.role_name, order = entry.order, "ignoring invalid wake order");
                continue;
            };
            if order == 0 || orders.iter().any(|o| o.key == key) {
                continue;
            }
            orders.push(SlotOrder { key, order });
        }
        if orders.is_empty() {
            None
        } else {
            Some(Self { orders })
        }
    }

    /// Like [`from_entries`](Self::from_entries) but falls back to the
    /// canonical order instead of failing.
    #[must_use]
    pub fn from_entries_or_canonical(entries: &[WakeOrderEntry]) -> Self {
        Self::from_entries(entries).unwrap_or_else(|| {
            warn!("wake order configuration missing or malformed, using canonical order");
            Self::canonical()
        })
    }

    /// Rank configured for `key`.
    #[must_use]
    pub fn order_of(&self, key: SlotKey) -> Option<u32> {
        self.orders.iter().find(|o| o.key == key).map(|o| o.order)
    }

    /// Configured ranks.
    #[must_use]
    pub fn orders(&self) -> &[SlotOrder] {
        &self.orders
    }
}

impl Default for WakeOrderConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

/// One sequenced opportunity for a role (or the collective) to act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightSlot {
    /// Grouping key.
    pub key: SlotKey,
    /// Lowest player id among the members.
    pub representative: PlayerId,
    /// Every member, in seat order.
    pub members: Vec<PlayerId>,
    /// Rank used for sorting.
    pub order: u32,
}

/// Resolves the slot sequence for `night`.
///
/// Dead players are left out unless `include_dead_roles` is set, which lets
/// the moderator keep calling out dead roles so the table cannot tell who
/// died. The result never holds two slots with the same key.
#[must_use]
pub fn resolve(
    roster: &Roster,
    ledgers: &Ledgers,
    config: &WakeOrderConfig,
    night: u32,
    include_dead_roles: bool,
) -> Vec<NightSlot> {
    let mut slots: Vec<NightSlot> = Vec::new();

    let candidates = roster
        .players()
        .iter()
        .filter(|p| include_dead_roles || ledgers.is_alive(p.id));

    for player in candidates {
        let key = SlotKey::for_player(player);
        if !key.wakes_on(night) {
            continue;
        }
        match slots.iter_mut().find(|s| s.key == key) {
            Some(slot) => {
                slot.members.push(player.id);
                slot.representative = slot.representative.min(player.id);
            }
            None => slots.push(NightSlot {
                key,
                representative: player.id,
                members: vec![player.id],
                order: config.order_of(key).unwrap_or(UNCONFIGURED_ORDER),
            }),
        }
    }

    // Stable: equal ranks keep discovery order.
    slots.sort_by_key(|s| s.order);
    slots
}
