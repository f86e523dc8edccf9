//! Battler module for the time-progress scheduler.
//!
//! This module provides the per-battler state the scheduler operates on:
//! - [`BattlerId`]: Unique identifier for a battler within a session
//! - [`Side`]: Which side of the battle a battler fights on
//! - [`TpbState`]: The readiness state machine (`charging → casting → acting → done`)
//! - [`Battler`]: Identity, pools, counters, action queue and result record
//! - [`BattlerView`]: Read-only snapshot handed to hooks and effect callbacks
//!
//! # Ownership
//!
//! Battlers are owned by the [`Roster`](crate::roster::Roster) of a
//! [`BattleSession`](crate::session::BattleSession). Counters and state are only
//! mutated from inside the crate; collaborators observe them through accessors,
//! [`BattlerView`] snapshots and transition events.
//!
//! # Example
//!
//! ```
//! use tpb_core::battler::{Battler, BattlerId, ResourcePools, Side, TpbState};
//!
//! let battler = Battler::new(BattlerId::new(0), Side::Ally, 0, 8, ResourcePools::full(100, 20, 0));
//! assert_eq!(battler.state(), TpbState::Charging);
//! assert_eq!(battler.charge_time(), 0);
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::action::ActionQueue;

pub use components::{Inventories, Inventory, ItemId, ResourcePools, ResultFlags};

/// Unique identifier for a battler within a session.
///
/// Identifiers are assigned monotonically by the roster and are never reused,
/// so a stale id held by an action can always be detected as "no longer in
/// battle".
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BattlerId(u32);

impl BattlerId {
    /// Creates a new `BattlerId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for BattlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BattlerId({})", self.0)
    }
}

impl fmt::Display for BattlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BattlerId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Side of the battle a battler belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Player-controlled party
    Ally,
    /// Enemy troop
    Opponent,
}

impl Side {
    /// Returns the opposing side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Ally => Self::Opponent,
            Self::Opponent => Self::Ally,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ally => write!(f, "Ally"),
            Self::Opponent => write!(f, "Opponent"),
        }
    }
}

/// Readiness state of a battler.
///
/// Exactly one state holds at any time. The normal cycle is
/// `Charging → Casting → Acting → Done → Charging`; zero-delay actions skip
/// `Casting`, and interrupts jump from `Casting` straight back to `Charging`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TpbState {
    /// Accruing readiness; no action executing.
    #[default]
    Charging,
    /// Waiting out the cast time of a chosen action.
    Casting,
    /// Executing an action's effect.
    Acting,
    /// Finished for this tick (or knocked out).
    Done,
}

impl fmt::Display for TpbState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Charging => write!(f, "charging"),
            Self::Casting => write!(f, "casting"),
            Self::Acting => write!(f, "acting"),
            Self::Done => write!(f, "done"),
        }
    }
}

// =============================================================================
// Battler
// =============================================================================

/// A combatant taking part in a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battler {
    pub(crate) id: BattlerId,
    pub(crate) side: Side,
    pub(crate) slot: usize,
    pub(crate) speed: u32,
    pub(crate) pools: ResourcePools,
    pub(crate) state: TpbState,
    pub(crate) charge_time: u32,
    pub(crate) cast_time: u32,
    pub(crate) required_cast_time: u32,
    pub(crate) queue: ActionQueue,
    pub(crate) result: ResultFlags,
    pub(crate) restricted: bool,
    pub(crate) knocked_out: bool,
}

impl Battler {
    /// Creates a new battler in the `Charging` state with empty counters.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier within the session
    /// * `side` - Ally or opponent
    /// * `slot` - Index within its side (used by index-based targeting)
    /// * `speed` - Charge gained per tick under speed-scaled charging
    /// * `pools` - Initial HP/MP/TP
    #[must_use]
    pub fn new(id: BattlerId, side: Side, slot: usize, speed: u32, pools: ResourcePools) -> Self {
        Self {
            id,
            side,
            slot,
            speed,
            pools,
            state: TpbState::Charging,
            charge_time: 0,
            cast_time: 0,
            required_cast_time: 0,
            queue: ActionQueue::new(),
            result: ResultFlags::empty(),
            restricted: false,
            knocked_out: false,
        }
    }

    /// Returns the battler's identifier.
    #[must_use]
    pub const fn id(&self) -> BattlerId {
        self.id
    }

    /// Returns the battler's side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Returns the battler's slot index within its side.
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Returns the battler's speed.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Returns the battler's resource pools.
    #[must_use]
    pub const fn pools(&self) -> &ResourcePools {
        &self.pools
    }

    /// Returns the current readiness state.
    #[must_use]
    pub const fn state(&self) -> TpbState {
        self.state
    }

    /// Returns the accumulated charge.
    #[must_use]
    pub const fn charge_time(&self) -> u32 {
        self.charge_time
    }

    /// Returns the accumulated cast progress.
    #[must_use]
    pub const fn cast_time(&self) -> u32 {
        self.cast_time
    }

    /// Returns the cast progress required by the action being cast.
    #[must_use]
    pub const fn required_cast_time(&self) -> u32 {
        self.required_cast_time
    }

    /// Returns the pending action queue.
    #[must_use]
    pub const fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Returns the result record of the current tick.
    #[must_use]
    pub const fn result(&self) -> ResultFlags {
        self.result
    }

    /// Returns true while a restriction prevents the battler from acting.
    #[must_use]
    pub const fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Returns true unless the battler has been knocked out.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.knocked_out
    }

    /// Sets the state, returning the previous one.
    pub(crate) fn set_state(&mut self, to: TpbState) -> TpbState {
        std::mem::replace(&mut self.state, to)
    }

    /// Zeroes the cast counters and, if requested, the charge counter.
    pub(crate) fn clear_counters(&mut self, charge: bool) {
        self.cast_time = 0;
        self.required_cast_time = 0;
        if charge {
            self.charge_time = 0;
        }
    }

    /// Returns a read-only snapshot of this battler.
    #[must_use]
    pub fn view(&self) -> BattlerView {
        BattlerView {
            id: self.id,
            side: self.side,
            slot: self.slot,
            state: self.state,
            pools: self.pools,
            restricted: self.restricted,
            alive: !self.knocked_out,
        }
    }
}

/// Read-only snapshot of a battler.
///
/// Handed to interrupt hooks, presenters and effect callbacks so collaborators
/// can inspect a battler without holding a borrow into the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlerView {
    /// Identifier of the battler.
    pub id: BattlerId,
    /// Side of the battler.
    pub side: Side,
    /// Slot within its side.
    pub slot: usize,
    /// Readiness state at snapshot time.
    pub state: TpbState,
    /// Resource pools at snapshot time.
    pub pools: ResourcePools,
    /// Whether a restriction is active.
    pub restricted: bool,
    /// Whether the battler is still standing.
    pub alive: bool,
}
