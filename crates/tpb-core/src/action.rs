//! Actions and the per-battler action queue.
//!
//! An [`Action`] is a single queued intent: who acts, which skill or item is
//! used, and how targets are selected. Two pieces of per-action state make the
//! cast protocol safe to resume:
//!
//! - `deferred_target`: the resolved target set, snapshotted once at cast start
//!   and reused verbatim at resolution
//! - `cost_paid`: set exactly once when the cost is deducted, so resuming a
//!   delayed action never charges the battler twice
//!
//! The [`ActionQueue`] is owned by its battler. Forced actions are pushed to the
//! front; an action that is only partially resolved (still casting) is put back
//! with [`ActionQueue::requeue`] instead of being dropped.
//!
//! # Example
//!
//! ```
//! use tpb_core::action::{Action, ActionQueue, TargetSelector, UsableRef};
//! use tpb_core::battler::BattlerId;
//!
//! let actor = BattlerId::new(0);
//! let mut queue = ActionQueue::new();
//! queue.push(Action::new(actor, UsableRef::Skill(1), TargetSelector::User), false);
//! queue.push(Action::new(actor, UsableRef::Skill(2), TargetSelector::User).forcing(), true);
//!
//! assert!(queue.peek().unwrap().is_forcing());
//! assert_eq!(queue.len(), 2);
//! ```

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battler::{BattlerId, ItemId};

// =============================================================================
// Usable references and target selection
// =============================================================================

/// Reference to the skill or item an action uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsableRef {
    /// A skill, by skill table index.
    Skill(u32),
    /// An item, by item table index.
    Item(ItemId),
}

impl fmt::Display for UsableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skill(id) => write!(f, "skill:{id}"),
            Self::Item(id) => write!(f, "{id}"),
        }
    }
}

/// Side relation relative to the acting battler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// The actor's own side.
    Friends,
    /// The opposing side.
    Opponents,
}

/// How an action picks its targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSelector {
    /// The actor itself.
    User,
    /// One explicit battler.
    Battler(BattlerId),
    /// Every standing member of a side.
    Side(Relation),
    /// The member at a slot index within a side.
    Index {
        /// Side to index into
        relation: Relation,
        /// Slot index within that side
        index: usize,
    },
    /// One standing member of a side, picked by the session's seeded RNG.
    Random(Relation),
}

/// Snapshot of the targets resolved when a cast started.
///
/// Once attached to an action it is never replaced, so the target set chosen
/// at cast start survives any roster churn during the cast delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredTarget(Vec<BattlerId>);

impl DeferredTarget {
    /// Creates a snapshot from a resolved target list.
    #[must_use]
    pub fn new(targets: Vec<BattlerId>) -> Self {
        Self(targets)
    }

    /// Returns the snapshotted targets in resolution order.
    #[must_use]
    pub fn as_slice(&self) -> &[BattlerId] {
        &self.0
    }

    /// Returns the number of snapshotted targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the snapshot holds no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Action
// =============================================================================

/// A single queued intent of a battler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    actor: BattlerId,
    usable: UsableRef,
    target: TargetSelector,
    deferred_target: Option<DeferredTarget>,
    cost_paid: bool,
    forcing: bool,
    sequence: u64,
}

impl Action {
    /// Creates a fresh, unforced action with no snapshot and no cost paid.
    #[must_use]
    pub const fn new(actor: BattlerId, usable: UsableRef, target: TargetSelector) -> Self {
        Self {
            actor,
            usable,
            target,
            deferred_target: None,
            cost_paid: false,
            forcing: false,
            sequence: 0,
        }
    }

    /// Marks the action as forced: it bypasses readiness and cast delay.
    #[must_use]
    pub const fn forcing(mut self) -> Self {
        self.forcing = true;
        self
    }

    /// Returns the acting battler.
    #[must_use]
    pub const fn actor(&self) -> BattlerId {
        self.actor
    }

    /// Returns the skill or item used.
    #[must_use]
    pub const fn usable(&self) -> UsableRef {
        self.usable
    }

    /// Returns the target selector.
    #[must_use]
    pub const fn target(&self) -> &TargetSelector {
        &self.target
    }

    /// Returns the target snapshot, if a cast has started.
    #[must_use]
    pub const fn deferred_target(&self) -> Option<&DeferredTarget> {
        self.deferred_target.as_ref()
    }

    /// Returns true once the cost has been deducted.
    #[must_use]
    pub const fn is_cost_paid(&self) -> bool {
        self.cost_paid
    }

    /// Returns true for forced actions.
    #[must_use]
    pub const fn is_forcing(&self) -> bool {
        self.forcing
    }

    /// Returns the insertion sequence stamped when the action was queued.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Attaches the target snapshot. Returns false, leaving the existing
    /// snapshot untouched, if one is already set.
    pub(crate) fn defer_targets(&mut self, targets: Vec<BattlerId>) -> bool {
        if self.deferred_target.is_some() {
            return false;
        }
        self.deferred_target = Some(DeferredTarget::new(targets));
        true
    }

    /// Records that the cost has been deducted. Returns true only on the call
    /// that flipped the flag.
    pub(crate) fn mark_cost_paid(&mut self) -> bool {
        !std::mem::replace(&mut self.cost_paid, true)
    }
}

// =============================================================================
// Action Queue
// =============================================================================

/// Ordered list of a battler's pending actions (normally one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionQueue {
    actions: VecDeque<Action>,
}

impl ActionQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an action at the back, or at the front when `front` is true
    /// (forced actions that must resolve ahead of scheduled ones).
    pub fn push(&mut self, action: Action, front: bool) {
        if front {
            self.actions.push_front(action);
        } else {
            self.actions.push_back(action);
        }
    }

    /// Returns the head action without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Action> {
        self.actions.front()
    }

    /// Removes and returns the head action.
    pub fn pop(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    /// Puts a partially resolved head action back in front of the queue so a
    /// later dispatch cycle picks it up again.
    pub fn requeue(&mut self, action: Action) {
        self.actions.push_front(action);
    }

    /// Drops every pending action, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let dropped = self.actions.len();
        self.actions.clear();
        dropped
    }

    /// Returns the number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterates over pending actions from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Action> + '_ {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(skill: u32) -> Action {
        Action::new(BattlerId::new(0), UsableRef::Skill(skill), TargetSelector::User)
    }

    mod action_tests {
        use super::*;

        #[test]
        fn new_action_is_fresh() {
            let a = action(1);
            assert!(!a.is_cost_paid());
            assert!(!a.is_forcing());
            assert!(a.deferred_target().is_none());
        }

        #[test]
        fn cost_paid_flips_once() {
            let mut a = action(1);
            assert!(a.mark_cost_paid());
            assert!(!a.mark_cost_paid());
            assert!(a.is_cost_paid());
        }

        #[test]
        fn deferred_target_is_set_once() {
            let mut a = action(1);
            assert!(a.defer_targets(vec![BattlerId::new(4)]));
            assert!(!a.defer_targets(vec![BattlerId::new(5), BattlerId::new(6)]));
            assert_eq!(a.deferred_target().unwrap().as_slice(), &[BattlerId::new(4)]);
        }
    }

    mod queue_tests {
        use super::*;

        #[test]
        fn push_front_goes_ahead() {
            let mut q = ActionQueue::new();
            q.push(action(1), false);
            q.push(action(2), true);
            assert_eq!(q.peek().unwrap().usable(), UsableRef::Skill(2));
        }

        #[test]
        fn peek_does_not_remove() {
            let mut q = ActionQueue::new();
            q.push(action(1), false);
            let _ = q.peek();
            assert_eq!(q.len(), 1);
        }

        #[test]
        fn requeue_restores_head() {
            let mut q = ActionQueue::new();
            q.push(action(1), false);
            q.push(action(2), false);
            let head = q.pop().unwrap();
            q.requeue(head);
            let order: Vec<_> = q.iter().map(Action::usable).collect();
            assert_eq!(order, vec![UsableRef::Skill(1), UsableRef::Skill(2)]);
        }

        #[test]
        fn clear_reports_dropped_count() {
            let mut q = ActionQueue::new();
            q.push(action(1), false);
            q.push(action(2), false);
            assert_eq!(q.clear(), 2);
            assert!(q.is_empty());
        }
    }
}
