//! Battler storage and dispatch lanes.
//!
//! The roster owns every [`Battler`] of a session in deterministic
//! ([`BTreeMap`]) order, and tracks which dispatch lane each one is in:
//!
//! - [`Lane::Charging`]: accruing readiness
//! - [`Lane::Ready`]: charged and waiting to be dispatched (FIFO)
//! - [`Lane::Holding`]: mid-cast, held aside until the cast completes
//! - [`Lane::Done`]: finished for this tick, or knocked out
//!
//! # Ownership rule
//!
//! Every battler is in exactly one lane. [`Roster::move_to`] is the only way to
//! change lanes; it removes the battler from its current lane and places it in
//! the new one in a single call, so no caller can leave a battler in two lanes
//! or in none.
//!
//! # Example
//!
//! ```
//! use tpb_core::battler::{ResourcePools, Side};
//! use tpb_core::roster::{Lane, Roster};
//!
//! let mut roster = Roster::new();
//! let hero = roster.insert(Side::Ally, 10, ResourcePools::full(100, 0, 0));
//! let slime = roster.insert(Side::Opponent, 5, ResourcePools::full(30, 0, 0));
//!
//! roster.move_to(hero, Lane::Ready);
//! roster.move_to(slime, Lane::Ready);
//! assert_eq!(roster.ready_order(), vec![hero, slime]);
//!
//! roster.move_to(hero, Lane::Holding);
//! assert_eq!(roster.ready_order(), vec![slime]);
//! ```

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::action::{Relation, TargetSelector};
use crate::battler::{Battler, BattlerId, ResourcePools, Side};

/// Dispatch lane of a battler.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// Accruing readiness.
    #[default]
    Charging,
    /// Charged and waiting for dispatch.
    Ready,
    /// Mid-cast; not eligible for dispatch until the cast completes.
    Holding,
    /// Finished for this tick, or out of the battle.
    Done,
}

/// All battlers of a session and their lanes.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    battlers: BTreeMap<BattlerId, Battler>,
    lanes: BTreeMap<BattlerId, Lane>,
    ready: VecDeque<BattlerId>,
    next_id: u32,
    next_slot: [usize; 2],
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a battler to a side and places it in the charging lane.
    ///
    /// Ids and slots are assigned in insertion order and never reused.
    pub fn insert(&mut self, side: Side, speed: u32, pools: ResourcePools) -> BattlerId {
        let id = BattlerId::new(self.next_id);
        self.next_id += 1;

        let slot = &mut self.next_slot[side_index(side)];
        let battler = Battler::new(id, side, *slot, speed, pools);
        *slot += 1;

        self.battlers.insert(id, battler);
        self.lanes.insert(id, Lane::Charging);
        id
    }

    /// Removes a battler from the roster and from every lane.
    pub fn remove(&mut self, id: BattlerId) -> Option<Battler> {
        if self.lanes.remove(&id) == Some(Lane::Ready) {
            self.ready.retain(|ready| *ready != id);
        }
        self.battlers.remove(&id)
    }

    /// Returns a battler.
    #[must_use]
    pub fn get(&self, id: BattlerId) -> Option<&Battler> {
        self.battlers.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: BattlerId) -> Option<&mut Battler> {
        self.battlers.get_mut(&id)
    }

    /// Returns true if the battler is in the roster.
    #[must_use]
    pub fn contains(&self, id: BattlerId) -> bool {
        self.battlers.contains_key(&id)
    }

    /// Iterates over battlers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Battler> + '_ {
        self.battlers.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Battler> + '_ {
        self.battlers.values_mut()
    }

    /// Returns the number of battlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.battlers.len()
    }

    /// Returns true if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.battlers.is_empty()
    }

    // =========================================================================
    // Lanes
    // =========================================================================

    /// Returns the lane a battler is in.
    #[must_use]
    pub fn lane_of(&self, id: BattlerId) -> Option<Lane> {
        self.lanes.get(&id).copied()
    }

    /// Moves a battler into `lane`, taking it out of its current lane.
    ///
    /// Moving into `Ready` appends to the back of the ready queue. Moving a
    /// battler into the lane it is already in does nothing, so its place in
    /// the ready queue is kept. Returns false for unknown battlers.
    pub fn move_to(&mut self, id: BattlerId, lane: Lane) -> bool {
        let Some(current) = self.lanes.get_mut(&id) else {
            return false;
        };
        if *current == lane {
            return true;
        }
        let from = std::mem::replace(current, lane);
        if from == Lane::Ready {
            self.ready.retain(|ready| *ready != id);
        }
        if lane == Lane::Ready {
            self.ready.push_back(id);
        }
        true
    }

    /// Returns the ids in a lane, in id order (ready queue order for `Ready`).
    #[must_use]
    pub fn in_lane(&self, lane: Lane) -> Vec<BattlerId> {
        if lane == Lane::Ready {
            return self.ready_order();
        }
        self.lanes
            .iter()
            .filter(|(_, l)| **l == lane)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns a snapshot of the ready queue, front first.
    #[must_use]
    pub fn ready_order(&self) -> Vec<BattlerId> {
        self.ready.iter().copied().collect()
    }

    // =========================================================================
    // Targeting
    // =========================================================================

    /// Returns the standing members of a side, ordered by slot.
    #[must_use]
    pub fn members(&self, side: Side) -> Vec<BattlerId> {
        // Slots increase with ids, so id order is slot order within a side.
        self.battlers
            .values()
            .filter(|b| b.side() == side && b.is_alive())
            .map(Battler::id)
            .collect()
    }

    /// Returns the battler sitting at `slot` on a side, standing or not.
    #[must_use]
    pub fn at_slot(&self, side: Side, slot: usize) -> Option<BattlerId> {
        self.battlers
            .values()
            .find(|b| b.side() == side && b.slot() == slot)
            .map(Battler::id)
    }

    /// Resolves a target selector from the point of view of `user`.
    ///
    /// Explicit battler targets are returned as given, even if no longer in the
    /// roster; the caller reports those as missing when the action resolves.
    /// Returns an empty list if `user` is unknown or nothing matches.
    pub fn resolve_targets(
        &self,
        user: BattlerId,
        selector: &TargetSelector,
        rng: &mut ChaCha8Rng,
    ) -> Vec<BattlerId> {
        let Some(actor) = self.get(user) else {
            return Vec::new();
        };
        let side_of = |relation: Relation| match relation {
            Relation::Friends => actor.side(),
            Relation::Opponents => actor.side().opposite(),
        };

        match selector {
            TargetSelector::User => vec![user],
            TargetSelector::Battler(id) => vec![*id],
            TargetSelector::Side(relation) => self.members(side_of(*relation)),
            TargetSelector::Index { relation, index } => {
                self.at_slot(side_of(*relation), *index).into_iter().collect()
            }
            TargetSelector::Random(relation) => {
                let members = self.members(side_of(*relation));
                if members.is_empty() {
                    return Vec::new();
                }
                vec![members[rng.gen_range(0..members.len())]]
            }
        }
    }
}

const fn side_index(side: Side) -> usize {
    match side {
        Side::Ally => 0,
        Side::Opponent => 1,
    }
}
