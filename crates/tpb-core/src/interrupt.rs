//! Interrupt controller.
//!
//! Cancels in-flight casts. Triggers (damage, restriction) are run through the
//! session's interrupt hook pipeline; a direct interrupt skips the pipeline.
//! Either way the cancellation itself is the same:
//!
//! 1. no-op unless the battler is `casting`
//! 2. drop its queued actions and zero its cast counters (and its charge,
//!    unless `reset_on_interrupt` is off)
//! 3. flag the result as interrupted and move the battler to `charging`,
//!    taking it out of the holding/ready lanes
//! 4. notify presenters and report [`Outcome::Interrupted`]
//!
//! Because step 1 checks the state that step 3 changes, interrupting twice in a
//! row is the same as interrupting once.

use tracing::debug;

use crate::battler::{BattlerId, ResultFlags, TpbState};
use crate::config::SchedulerConfig;
use crate::event::{InterruptCause, Journal, Outcome};
use crate::hook::InterruptTrigger;
use crate::roster::{Lane, Roster};

/// Cancels casts according to the session's reset policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptController {
    reset_charge: bool,
}

impl InterruptController {
    /// Creates a controller from the scheduler configuration.
    #[must_use]
    pub const fn new(config: &SchedulerConfig) -> Self {
        Self {
            reset_charge: config.reset_on_interrupt,
        }
    }

    /// Returns true if interrupted battlers lose their charge.
    #[must_use]
    pub const fn resets_charge(&self) -> bool {
        self.reset_charge
    }

    /// Runs `trigger` through the hook pipeline and interrupts the battler if
    /// a hook cancels. Returns true if a cast was cancelled.
    pub(crate) fn on_trigger(
        &self,
        roster: &mut Roster,
        journal: &mut Journal<'_>,
        outcomes: &mut Vec<(BattlerId, Outcome)>,
        id: BattlerId,
        trigger: &InterruptTrigger,
    ) -> bool {
        let Some(battler) = roster.get(id) else {
            return false;
        };
        if battler.state() != TpbState::Casting {
            return false;
        }
        let cancelled_by = journal.hooks.evaluate(trigger, &battler.view());
        match cancelled_by {
            Some(hook) => self.interrupt(roster, journal, outcomes, id, InterruptCause::Hook(hook)),
            None => false,
        }
    }

    /// Cancels the battler's cast. Returns false (and changes nothing) unless
    /// the battler was casting.
    pub(crate) fn interrupt(
        &self,
        roster: &mut Roster,
        journal: &mut Journal<'_>,
        outcomes: &mut Vec<(BattlerId, Outcome)>,
        id: BattlerId,
        cause: InterruptCause,
    ) -> bool {
        let Some(battler) = roster.get_mut(id) else {
            return false;
        };
        if battler.state() != TpbState::Casting {
            return false;
        }

        let dropped = battler.queue.clear();
        battler.clear_counters(self.reset_charge);
        battler.result.insert(ResultFlags::INTERRUPTED);
        journal.transition(battler, TpbState::Charging);

        let view = battler.view();
        let flags = battler.result();
        roster.move_to(id, Lane::Charging);

        journal
            .hooks
            .notify(|presenter| presenter.action_interrupted(&view, &cause, flags));
        debug!(tick = journal.tick, battler = %id, dropped, ?cause, "cast interrupted");
        outcomes.push((id, Outcome::Interrupted { cause }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, TargetSelector, UsableRef};
    use crate::battler::ResourcePools;
    use crate::battler::Side;
    use crate::event::EventLog;
    use crate::hook::HookRegistry;

    struct Fixture {
        roster: Roster,
        log: EventLog,
        hooks: HookRegistry,
        outcomes: Vec<(BattlerId, Outcome)>,
        caster: BattlerId,
    }

    fn fixture(config: &SchedulerConfig) -> Fixture {
        let mut roster = Roster::new();
        let caster = roster.insert(Side::Ally, 10, ResourcePools::full(50, 10, 0));
        let battler = roster.get_mut(caster).unwrap();
        battler.charge_time = 100;
        battler.required_cast_time = 20;
        battler.cast_time = 10;
        battler.set_state(TpbState::Casting);
        battler
            .queue
            .push(Action::new(caster, UsableRef::Skill(1), TargetSelector::User), false);
        roster.move_to(caster, Lane::Holding);
        Fixture {
            roster,
            log: EventLog::new(),
            hooks: HookRegistry::with_defaults(config),
            outcomes: Vec::new(),
            caster,
        }
    }

    fn interrupt(controller: &InterruptController, f: &mut Fixture) -> bool {
        let mut journal = Journal {
            tick: 10,
            log: &mut f.log,
            hooks: &f.hooks,
        };
        controller.interrupt(
            &mut f.roster,
            &mut journal,
            &mut f.outcomes,
            f.caster,
            InterruptCause::Direct,
        )
    }

    #[test]
    fn interrupt_returns_caster_to_charging() {
        let config = SchedulerConfig::default();
        let controller = InterruptController::new(&config);
        let mut f = fixture(&config);

        assert!(interrupt(&controller, &mut f));

        let battler = f.roster.get(f.caster).unwrap();
        assert_eq!(battler.state(), TpbState::Charging);
        assert_eq!(
            (battler.charge_time(), battler.cast_time(), battler.required_cast_time()),
            (0, 0, 0)
        );
        assert!(battler.queue().is_empty());
        assert!(battler.result().contains(ResultFlags::INTERRUPTED));
        assert_eq!(f.roster.lane_of(f.caster), Some(Lane::Charging));

        let events = f.log.take_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].flags.contains(ResultFlags::INTERRUPTED));
    }

    #[test]
    fn interrupt_is_idempotent() {
        let config = SchedulerConfig::default();
        let controller = InterruptController::new(&config);
        let mut f = fixture(&config);

        assert!(interrupt(&controller, &mut f));
        let once = f.roster.get(f.caster).cloned();
        assert!(!interrupt(&controller, &mut f));

        assert_eq!(f.roster.get(f.caster).cloned(), once);
        assert_eq!(f.outcomes.len(), 1);
        assert_eq!(f.log.len(), 1);
    }

    #[test]
    fn charge_survives_when_reset_is_off() {
        let config = SchedulerConfig {
            reset_on_interrupt: false,
            ..SchedulerConfig::default()
        };
        let controller = InterruptController::new(&config);
        let mut f = fixture(&config);

        interrupt(&controller, &mut f);
        let battler = f.roster.get(f.caster).unwrap();
        assert_eq!(battler.charge_time(), 100);
        assert_eq!(battler.cast_time(), 0);
    }

    #[test]
    fn trigger_respects_the_pipeline() {
        let config = SchedulerConfig::default();
        let controller = InterruptController::new(&config);
        let mut f = fixture(&config);
        let mut journal = Journal {
            tick: 10,
            log: &mut f.log,
            hooks: &f.hooks,
        };

        // Damage does not interrupt without the damage hook.
        assert!(!controller.on_trigger(
            &mut f.roster,
            &mut journal,
            &mut f.outcomes,
            f.caster,
            &InterruptTrigger::Damage { amount: 5 },
        ));
        assert!(controller.on_trigger(
            &mut f.roster,
            &mut journal,
            &mut f.outcomes,
            f.caster,
            &InterruptTrigger::Restriction,
        ));
        assert_eq!(
            f.outcomes,
            vec![(
                f.caster,
                Outcome::Interrupted {
                    cause: InterruptCause::Hook("restriction".into())
                }
            )]
        );
    }
}
