//! Resource components carried by battlers and sides.
//!
//! - [`ResourcePools`]: HP/MP/TP pools owned by a single battler
//! - [`Inventory`]: consumable items shared by one side of the battle
//! - [`ResultFlags`]: per-tick result record used for downstream reporting

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::Side;

// =============================================================================
// Resource Pools
// =============================================================================

/// HP, MP and TP pools of a battler.
///
/// All values are unsigned; spending more than is available is rejected by
/// [`ResourcePools::can_afford`] before any deduction happens, so the pools
/// never underflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePools {
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Current magic points.
    pub mp: u32,
    /// Maximum magic points.
    pub max_mp: u32,
    /// Current technique points.
    pub tp: u32,
    /// Maximum technique points.
    pub max_tp: u32,
}

impl ResourcePools {
    /// Creates full pools with the given maxima.
    ///
    /// # Example
    ///
    /// ```
    /// use tpb_core::battler::ResourcePools;
    ///
    /// let pools = ResourcePools::full(100, 30, 100);
    /// assert_eq!(pools.hp, 100);
    /// assert_eq!(pools.mp, 30);
    /// ```
    #[must_use]
    pub const fn full(max_hp: u32, max_mp: u32, max_tp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            mp: max_mp,
            max_mp,
            tp: max_tp,
            max_tp,
        }
    }

    /// Returns true if the pools hold at least `mp` MP and `tp` TP.
    #[must_use]
    pub const fn can_afford(&self, mp: u32, tp: u32) -> bool {
        self.mp >= mp && self.tp >= tp
    }

    /// Deducts MP and TP, saturating at zero.
    pub fn spend(&mut self, mp: u32, tp: u32) {
        self.mp = self.mp.saturating_sub(mp);
        self.tp = self.tp.saturating_sub(tp);
    }

    /// Applies HP damage and returns the amount actually removed.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Restores HP, capped at the maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }

    /// Returns true once HP has reached zero.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.hp == 0
    }
}

// =============================================================================
// Items
// =============================================================================

/// Identifier of a consumable item in the item table.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new `ItemId` from a raw table index.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw table index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item:{}", self.0)
    }
}

/// Item stock held by one side of the battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<ItemId, u32>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` units of an item.
    pub fn add(&mut self, item: ItemId, count: u32) {
        let slot = self.items.entry(item).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    /// Returns how many units of an item are held.
    #[must_use]
    pub fn count(&self, item: ItemId) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    /// Removes one unit of an item. Returns false if none were held.
    pub fn consume(&mut self, item: ItemId) -> bool {
        match self.items.get_mut(&item) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

/// The two inventories of a battle, one per side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventories {
    ally: Inventory,
    opponent: Inventory,
}

impl Inventories {
    /// Returns the inventory of a side.
    #[must_use]
    pub const fn for_side(&self, side: Side) -> &Inventory {
        match side {
            Side::Ally => &self.ally,
            Side::Opponent => &self.opponent,
        }
    }

    /// Returns the inventory of a side mutably.
    pub fn for_side_mut(&mut self, side: Side) -> &mut Inventory {
        match side {
            Side::Ally => &mut self.ally,
            Side::Opponent => &mut self.opponent,
        }
    }
}

// =============================================================================
// Result Flags
// =============================================================================

bitflags! {
    /// Result record of a battler for the current tick.
    ///
    /// Cleared at the start of every scheduler step.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ResultFlags: u8 {
        /// The battler was the target of a resolved action.
        const USED        = 1 << 0;
        /// The battler's cast was interrupted.
        const INTERRUPTED = 1 << 1;
        /// The battler lost HP.
        const HP_DAMAGE   = 1 << 2;
    }
}
