//! Cast-time gate.
//!
//! The gate decides which path a dispatched action takes and settles its cost
//! exactly once:
//!
//! ```text
//!            delay > 0                 cast complete
//! charging ────────────▶ casting ─────────────────────▶ acting ──▶ done
//!    │                      │ interrupt                   ▲
//!    │                      ▼                             │
//!    │                  charging                          │
//!    └────────────────────── delay == 0 ──────────────────┘
//! ```
//!
//! - [`GatePath::Forced`]: the action is forcing; it runs at once and takes
//!   precedence over every other path
//! - [`GatePath::BeginCast`]: snapshot targets, pay, put the action back at the
//!   front of the queue and wait out the delay
//! - [`GatePath::Resume`]: the cast completed; reuse the snapshot, skip payment
//! - [`GatePath::DegradedResume`]: a casting battler's head action has no
//!   snapshot; it is run as a fresh immediate action
//! - [`GatePath::Immediate`]: zero delay; pay and run in one dispatch
//!
//! # Example
//!
//! ```
//! use tpb_core::action::{Action, TargetSelector, UsableRef};
//! use tpb_core::battler::{BattlerId, TpbState};
//! use tpb_core::gate::{CastTimeGate, GatePath};
//!
//! let action = Action::new(BattlerId::new(0), UsableRef::Skill(1), TargetSelector::User);
//! assert_eq!(CastTimeGate::classify(TpbState::Charging, &action, 20), GatePath::BeginCast);
//! assert_eq!(CastTimeGate::classify(TpbState::Charging, &action, 0), GatePath::Immediate);
//! assert_eq!(CastTimeGate::classify(TpbState::Casting, &action, 20), GatePath::DegradedResume);
//! ```

use crate::action::Action;
use crate::battler::{Inventory, ResourcePools, TpbState};
use crate::catalog::Cost;
use crate::event::Fault;

/// Path an action takes through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePath {
    /// Run at once, ignoring readiness and delay.
    Forced,
    /// Zero delay: pay and resolve in the same dispatch.
    Immediate,
    /// Enter `casting`.
    BeginCast,
    /// Leave `casting` and resolve against the snapshot.
    Resume,
    /// Resume without a snapshot; treated as a fresh immediate action.
    DegradedResume,
}

/// Result of settling an action's cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostSettlement {
    /// The cost was deducted now.
    Charged,
    /// The cost had already been paid; nothing was deducted.
    Skipped,
}

/// Stateless decision logic of the cast-time protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct CastTimeGate;

impl CastTimeGate {
    /// Picks the path for `action` given the battler's state and the action's
    /// sanitized delay.
    #[must_use]
    pub fn classify(state: TpbState, action: &Action, delay: u32) -> GatePath {
        if action.is_forcing() {
            return GatePath::Forced;
        }
        match state {
            TpbState::Casting if action.deferred_target().is_some() => GatePath::Resume,
            TpbState::Casting => GatePath::DegradedResume,
            _ if delay == 0 => GatePath::Immediate,
            _ => GatePath::BeginCast,
        }
    }

    /// Returns true if the action can be executed with the given pools.
    ///
    /// A paid action is always valid: the resources have already left the
    /// ledger, so later spending must not block it.
    #[must_use]
    pub fn is_affordable(action: &Action, cost: &Cost, pools: &ResourcePools, inventory: &Inventory) -> bool {
        if action.is_cost_paid() {
            return true;
        }
        let has_item = cost.item.map_or(true, |item| inventory.count(item) > 0);
        pools.can_afford(cost.mp, cost.tp) && has_item
    }

    /// Deducts the cost of `action` unless it has already been paid.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::InsufficientResources`] if the action is unpaid and the
    /// battler cannot cover it. Nothing is deducted in that case.
    pub fn settle_cost(
        action: &mut Action,
        cost: &Cost,
        pools: &mut ResourcePools,
        inventory: &mut Inventory,
    ) -> Result<CostSettlement, Fault> {
        if action.is_cost_paid() {
            return Ok(CostSettlement::Skipped);
        }
        if !Self::is_affordable(action, cost, pools, inventory) {
            return Err(Fault::InsufficientResources);
        }
        pools.spend(cost.mp, cost.tp);
        if let Some(item) = cost.item {
            inventory.consume(item);
        }
        action.mark_cost_paid();
        Ok(CostSettlement::Charged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{TargetSelector, UsableRef};
    use crate::battler::{BattlerId, ItemId};

    fn action() -> Action {
        Action::new(BattlerId::new(0), UsableRef::Skill(1), TargetSelector::User)
    }

    mod classify_tests {
        use super::*;

        #[test]
        fn forcing_takes_precedence() {
            let forced = action().forcing();
            for state in [TpbState::Charging, TpbState::Casting, TpbState::Done] {
                assert_eq!(CastTimeGate::classify(state, &forced, 50), GatePath::Forced);
            }
        }

        #[test]
        fn casting_with_snapshot_resumes() {
            let mut a = action();
            a.defer_targets(vec![BattlerId::new(1)]);
            assert_eq!(CastTimeGate::classify(TpbState::Casting, &a, 20), GatePath::Resume);
        }

        #[test]
        fn delay_decides_between_cast_and_immediate() {
            assert_eq!(CastTimeGate::classify(TpbState::Charging, &action(), 1), GatePath::BeginCast);
            assert_eq!(CastTimeGate::classify(TpbState::Charging, &action(), 0), GatePath::Immediate);
        }
    }

    mod cost_tests {
        use super::*;

        #[test]
        fn cost_is_settled_once() {
            let mut a = action();
            let mut pools = ResourcePools::full(10, 20, 10);
            let mut inventory = Inventory::new();
            let cost = Cost { mp: 5, tp: 3, item: None };

            assert_eq!(
                CastTimeGate::settle_cost(&mut a, &cost, &mut pools, &mut inventory),
                Ok(CostSettlement::Charged)
            );
            assert_eq!(
                CastTimeGate::settle_cost(&mut a, &cost, &mut pools, &mut inventory),
                Ok(CostSettlement::Skipped)
            );
            assert_eq!((pools.mp, pools.tp), (15, 7));
            assert!(a.is_cost_paid());
        }

        #[test]
        fn unaffordable_cost_deducts_nothing() {
            let mut a = action();
            let mut pools = ResourcePools::full(10, 2, 0);
            let mut inventory = Inventory::new();
            let cost = Cost { mp: 5, tp: 0, item: None };

            assert_eq!(
                CastTimeGate::settle_cost(&mut a, &cost, &mut pools, &mut inventory),
                Err(Fault::InsufficientResources)
            );
            assert_eq!(pools.mp, 2);
            assert!(!a.is_cost_paid());
        }

        #[test]
        fn items_are_consumed_once() {
            let potion = ItemId::new(4);
            let mut a = action();
            let mut pools = ResourcePools::default();
            let mut inventory = Inventory::new();
            inventory.add(potion, 1);
            let cost = Cost { mp: 0, tp: 0, item: Some(potion) };

            CastTimeGate::settle_cost(&mut a, &cost, &mut pools, &mut inventory).unwrap();
            CastTimeGate::settle_cost(&mut a, &cost, &mut pools, &mut inventory).unwrap();
            assert_eq!(inventory.count(potion), 0);
        }

        #[test]
        fn missing_item_is_unaffordable() {
            let a = action();
            let cost = Cost { mp: 0, tp: 0, item: Some(ItemId::new(1)) };
            assert!(!CastTimeGate::is_affordable(&a, &cost, &ResourcePools::default(), &Inventory::new()));
        }

        #[test]
        fn paid_actions_stay_valid() {
            let mut a = action();
            a.mark_cost_paid();
            let cost = Cost { mp: 999, tp: 0, item: None };
            assert!(CastTimeGate::is_affordable(&a, &cost, &ResourcePools::default(), &Inventory::new()));
        }
    }
}
