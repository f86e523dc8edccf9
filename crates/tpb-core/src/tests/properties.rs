//! Scheduler invariants under random command sequences.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use crate::action::{Action, TargetSelector, UsableRef};
use crate::battler::{BattlerId, Side, TpbState};
use crate::config::{ChargeRate, SchedulerConfig};
use crate::roster::Lane;
use crate::session::BattleSession;

use super::helpers::{duel, FIREBALL, QUICK_FIRE, RIPOSTE, SLIME, SMITE, STRIKE, STUN};

const SKILLS: [UsableRef; 6] = [STRIKE, FIREBALL, QUICK_FIRE, STUN, RIPOSTE, SMITE];

#[derive(Debug, Clone)]
enum Op {
    Step(u8),
    Queue { actor: usize, skill: usize, target: usize },
    Force { actor: usize, skill: usize, target: usize },
    Damage { target: usize, amount: u32 },
    Restrict(usize),
    Lift(usize),
    Interrupt(usize),
}

fn op() -> impl Strategy<Value = Op> {
    let pick = || (0..3usize, 0..SKILLS.len(), 0..3usize);
    prop_oneof![
        4 => (1u8..8).prop_map(Op::Step),
        4 => pick().prop_map(|(actor, skill, target)| Op::Queue { actor, skill, target }),
        1 => pick().prop_map(|(actor, skill, target)| Op::Force { actor, skill, target }),
        2 => (0..3usize, 0u32..40).prop_map(|(target, amount)| Op::Damage { target, amount }),
        1 => (0..3usize).prop_map(Op::Restrict),
        1 => (0..3usize).prop_map(Op::Lift),
        2 => (0..3usize).prop_map(Op::Interrupt),
    ]
}

fn action(ids: &[BattlerId], actor: usize, skill: usize, target: usize) -> Action {
    Action::new(ids[actor], SKILLS[skill], TargetSelector::Battler(ids[target]))
}

/// Applies one op. Commands are allowed to fail; the invariants must hold
/// either way.
fn apply(s: &mut BattleSession, ids: &[BattlerId], op: &Op) -> Result<(), TestCaseError> {
    match *op {
        Op::Step(count) => {
            for _ in 0..count {
                s.step();
            }
        }
        Op::Queue { actor, skill, target } => {
            let _ = s.queue_action(action(ids, actor, skill, target));
        }
        Op::Force { actor, skill, target } => {
            let _ = s.force_action(action(ids, actor, skill, target));
        }
        Op::Damage { target, amount } => {
            let _ = s.apply_damage(ids[target], amount);
        }
        Op::Restrict(target) => {
            let _ = s.apply_restriction(ids[target]);
        }
        Op::Lift(target) => {
            let _ = s.lift_restriction(ids[target]);
        }
        Op::Interrupt(target) => {
            let id = ids[target];
            s.interrupt(id).map_err(|e| TestCaseError::fail(e.to_string()))?;
            let once = s.battler(id).cloned();
            prop_assert_eq!(s.interrupt(id), Ok(false));
            prop_assert_eq!(s.battler(id).cloned(), once);
        }
    }
    Ok(())
}

fn check(s: &BattleSession, mp_seen: &mut BTreeMap<BattlerId, u32>) -> Result<(), TestCaseError> {
    let threshold = s.config().charge_threshold;
    let ready: Vec<_> = s.roster().ready_order();
    let unique: BTreeSet<_> = ready.iter().collect();
    prop_assert_eq!(unique.len(), ready.len(), "ready lane holds duplicates");

    for battler in s.battlers() {
        let id = battler.id();
        let lane = s.roster().lane_of(id);
        prop_assert!(lane.is_some(), "{} has no lane", id);
        let lane = lane.unwrap_or_default();

        prop_assert_ne!(battler.state(), TpbState::Acting);
        prop_assert!(battler.charge_time() <= threshold);
        prop_assert_eq!(ready.contains(&id), lane == Lane::Ready);

        if lane == Lane::Done {
            prop_assert_eq!(battler.state(), TpbState::Done);
        }
        if lane == Lane::Holding {
            prop_assert_eq!(battler.state(), TpbState::Casting);
        }
        if !battler.is_alive() {
            prop_assert_eq!(lane, Lane::Done);
            prop_assert!(battler.queue().is_empty());
        }
        if battler.state() == TpbState::Casting {
            prop_assert!(matches!(lane, Lane::Holding | Lane::Ready));
            let head = battler.queue().peek();
            prop_assert!(head.is_some_and(|a| a.is_cost_paid() && a.deferred_target().is_some()));
            prop_assert!(battler.cast_time() <= battler.required_cast_time());
        }

        let mp = battler.pools().mp;
        if let Some(previous) = mp_seen.insert(id, mp) {
            prop_assert!(mp <= previous, "{} regained mp", id);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn scheduler_invariants_hold(
        ops in prop::collection::vec(op(), 1..80),
        interrupt_on_damage in any::<bool>(),
        reset_on_interrupt in any::<bool>(),
    ) {
        let config = SchedulerConfig {
            charge_rate: ChargeRate::Fixed(34),
            turn_length: 7,
            interrupt_on_damage,
            reset_on_interrupt,
            ..SchedulerConfig::default()
        };
        let (mut s, hero, slime) = duel(config);
        let extra = s.enlist(Side::Opponent, SLIME).unwrap();
        let ids = [hero, slime, extra];

        let mut mp_seen = BTreeMap::new();
        check(&s, &mut mp_seen)?;
        for op in &ops {
            apply(&mut s, &ids, op)?;
            check(&s, &mut mp_seen)?;
        }
    }

    #[test]
    fn step_reports_are_numbered_by_tick(steps in 1u64..50) {
        let (mut s, _, _) = duel(SchedulerConfig::default());
        for expected in 1..=steps {
            prop_assert_eq!(s.step().tick, expected);
        }
        prop_assert_eq!(s.tick(), steps);
    }
}
