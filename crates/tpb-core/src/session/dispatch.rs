//! Turn dispatcher.
//!
//! One call to [`BattleSession::step`] is one scheduler tick:
//!
//! 1. clear last tick's result flags; battlers that finished last tick go back
//!    to `charging`
//! 2. advance readiness clocks (charging lane) and cast progress (holding
//!    lane); battlers that cross their threshold join the back of the ready
//!    queue
//! 3. dispatch the ready queue front to back, skipping battlers that are no
//!    longer ready, were interrupted this tick, are restricted or have nothing
//!    queued; forced follow-ups run right after the battler that caused them
//! 4. apply the turn boundary if this tick closes a turn
//!
//! A battler that starts casting is moved to the holding lane, so it cannot be
//! dispatched again in the same tick; its resume always happens on a later one.

use tracing::{debug, trace, warn};

use super::{BattleSession, MAX_FORCED_CHAIN};
use crate::action::Action;
use crate::battler::{BattlerId, ResultFlags, TpbState};
use crate::catalog::ActionDefinition;
use crate::event::{Fault, Journal, Outcome, StepReport};
use crate::gate::{CastTimeGate, GatePath};
use crate::roster::Lane;

impl BattleSession {
    /// Advances the battle by one tick and reports what happened.
    ///
    /// Outcomes of commands issued since the previous step (forced actions,
    /// external damage, direct interrupts) happened on the previous tick and
    /// are reported separately in [`StepReport::between_steps`].
    pub fn step(&mut self) -> StepReport {
        let between_steps = std::mem::take(&mut self.outcomes);
        self.tick += 1;
        let tick = self.tick;

        self.begin_tick();
        self.advance_clocks();

        for id in self.roster.ready_order() {
            if !self.is_dispatchable(id) {
                continue;
            }
            self.dispatch_one(id);
            self.drain_forced();
        }

        let turn_length = u64::from(self.config.turn_length);
        if turn_length > 0 && tick % turn_length == 0 {
            self.end_turn();
        }

        StepReport {
            tick,
            between_steps,
            outcomes: std::mem::take(&mut self.outcomes),
        }
    }

    fn begin_tick(&mut self) {
        for battler in self.roster.iter_mut() {
            battler.result = ResultFlags::empty();
        }

        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        for id in self.roster.in_lane(Lane::Done) {
            let Some(battler) = self.roster.get_mut(id) else {
                continue;
            };
            if !battler.is_alive() {
                continue;
            }
            battler.clear_counters(true);
            journal.transition(battler, TpbState::Charging);
            self.roster.move_to(id, Lane::Charging);
        }
    }

    fn advance_clocks(&mut self) {
        let clock = self.clock;
        let mut ready = Vec::new();

        for id in self.roster.in_lane(Lane::Charging) {
            let Some(battler) = self.roster.get_mut(id) else {
                continue;
            };
            if battler.is_alive() && clock.tick(battler) {
                ready.push((battler.queue().peek().map_or(u64::MAX, Action::sequence), id));
            }
            trace!(tick = self.tick, battler = %id, charge = battler.charge_time(), "charge");
        }
        for id in self.roster.in_lane(Lane::Holding) {
            let Some(battler) = self.roster.get_mut(id) else {
                continue;
            };
            if clock.tick_cast(battler) {
                ready.push((battler.queue().peek().map_or(u64::MAX, Action::sequence), id));
            }
            trace!(tick = self.tick, battler = %id, cast = battler.cast_time(), "cast progress");
        }

        // Same-tick arrivals are ordered by when their head action was queued.
        ready.sort_unstable();
        for (_, id) in ready {
            self.roster.move_to(id, Lane::Ready);
        }
    }

    fn is_dispatchable(&self, id: BattlerId) -> bool {
        self.roster.lane_of(id) == Some(Lane::Ready)
            && self.roster.get(id).is_some_and(|b| {
                b.is_alive()
                    && !b.is_restricted()
                    && !b.result().contains(ResultFlags::INTERRUPTED)
                    && !b.queue().is_empty()
            })
    }

    /// Pops the battler's head action and runs it through the gate.
    pub(super) fn dispatch_one(&mut self, id: BattlerId) -> Option<Outcome> {
        let battler = self.roster.get_mut(id)?;
        let state = battler.state();
        let action = battler.queue.pop()?;
        let usable = action.usable();

        let outcome = match self.catalog.definition(usable) {
            None if action.is_forcing() => {
                warn!(tick = self.tick, battler = %id, %usable, "forced action has no definition");
                Outcome::Faulted(Fault::UnknownUsable(usable))
            }
            None => self.fault(id, Fault::UnknownUsable(usable)),
            Some(definition) => {
                let delay = definition.delay_for(usable);
                match CastTimeGate::classify(state, &action, delay) {
                    GatePath::Forced => self.execute_forced(id, action, &definition)?,
                    GatePath::BeginCast => self.begin_cast(id, action, &definition, delay)?,
                    GatePath::Immediate => self.resolve_now(id, action, &definition)?,
                    GatePath::Resume => self.resume_cast(id, action, &definition)?,
                    GatePath::DegradedResume => {
                        warn!(
                            tick = self.tick,
                            battler = %id,
                            %usable,
                            "resuming a cast without a target snapshot, running it as a fresh action"
                        );
                        self.resolve_now(id, action, &definition)?
                    }
                }
            }
        };

        self.outcomes.push((id, outcome.clone()));
        Some(outcome)
    }

    // =========================================================================
    // Gate paths
    // =========================================================================

    fn begin_cast(
        &mut self,
        id: BattlerId,
        mut action: Action,
        definition: &ActionDefinition,
        delay: u32,
    ) -> Option<Outcome> {
        let usable = action.usable();
        let targets = self.roster.resolve_targets(id, action.target(), &mut self.rng);
        let cost = definition.cost_for(usable);

        let battler = self.roster.get_mut(id)?;
        let inventory = self.inventories.for_side_mut(battler.side());
        if let Err(fault) = CastTimeGate::settle_cost(&mut action, &cost, &mut battler.pools, inventory) {
            return Some(self.fault(id, fault));
        }

        action.defer_targets(targets);
        battler.required_cast_time = delay;
        battler.cast_time = 0;
        battler.queue.requeue(action);

        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        journal.transition(battler, TpbState::Casting);
        let view = battler.view();
        let ready_in = self.clock.remaining_ticks(battler);
        self.roster.move_to(id, Lane::Holding);

        self.hooks
            .notify(|presenter| presenter.cast_started(&view, usable, delay));
        debug!(tick = self.tick, battler = %id, %usable, delay, ready_in, "cast started");
        Some(Outcome::CastStarted { ready_in })
    }

    fn resume_cast(
        &mut self,
        id: BattlerId,
        mut action: Action,
        definition: &ActionDefinition,
    ) -> Option<Outcome> {
        let usable = action.usable();
        let targets = action
            .deferred_target()
            .map(|snapshot| snapshot.as_slice().to_vec())
            .unwrap_or_default();
        let cost = definition.cost_for(usable);

        let battler = self.roster.get_mut(id)?;
        let inventory = self.inventories.for_side_mut(battler.side());
        if let Err(fault) = CastTimeGate::settle_cost(&mut action, &cost, &mut battler.pools, inventory) {
            return Some(self.fault(id, fault));
        }

        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        journal.transition(battler, TpbState::Acting);
        debug!(tick = self.tick, battler = %id, %usable, "cast complete");

        let resolution = self.execute(id, usable, definition, &targets);
        self.finish_action(id);
        Some(Outcome::Resolved(resolution))
    }

    fn resolve_now(
        &mut self,
        id: BattlerId,
        mut action: Action,
        definition: &ActionDefinition,
    ) -> Option<Outcome> {
        let usable = action.usable();
        let targets = self.roster.resolve_targets(id, action.target(), &mut self.rng);
        let cost = definition.cost_for(usable);

        let battler = self.roster.get_mut(id)?;
        let inventory = self.inventories.for_side_mut(battler.side());
        if let Err(fault) = CastTimeGate::settle_cost(&mut action, &cost, &mut battler.pools, inventory) {
            return Some(self.fault(id, fault));
        }

        if self.config.announce_instant_casts {
            let view = battler.view();
            self.hooks
                .notify(|presenter| presenter.cast_started(&view, usable, 0));
        }
        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        journal.transition(battler, TpbState::Acting);

        let resolution = self.execute(id, usable, definition, &targets);
        self.finish_action(id);
        Some(Outcome::Resolved(resolution))
    }

    /// Runs a forced action. The actor's state, counters and remaining queue
    /// are left as they were, so a cast in progress keeps its schedule.
    fn execute_forced(
        &mut self,
        id: BattlerId,
        mut action: Action,
        definition: &ActionDefinition,
    ) -> Option<Outcome> {
        let usable = action.usable();
        let targets = match action.deferred_target() {
            Some(snapshot) => snapshot.as_slice().to_vec(),
            None => self.roster.resolve_targets(id, action.target(), &mut self.rng),
        };
        let cost = definition.cost_for(usable);

        let battler = self.roster.get_mut(id)?;
        let inventory = self.inventories.for_side_mut(battler.side());
        if let Err(fault) = CastTimeGate::settle_cost(&mut action, &cost, &mut battler.pools, inventory) {
            warn!(tick = self.tick, battler = %id, %usable, ?fault, "forced action could not be paid");
            return Some(Outcome::Faulted(fault));
        }

        debug!(tick = self.tick, battler = %id, %usable, "forced action");
        let resolution = self.execute(id, usable, definition, &targets);
        Some(Outcome::Resolved(resolution))
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Ends the battler's turn: counters zeroed, `done` until next tick.
    fn finish_action(&mut self, id: BattlerId) {
        let Some(battler) = self.roster.get_mut(id) else {
            return;
        };
        battler.clear_counters(true);
        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        journal.transition(battler, TpbState::Done);
        self.roster.move_to(id, Lane::Done);
    }

    /// Reports a fault and ends the battler's turn so it cannot get stuck.
    fn fault(&mut self, id: BattlerId, fault: Fault) -> Outcome {
        warn!(tick = self.tick, battler = %id, ?fault, "action faulted");
        self.finish_action(id);
        Outcome::Faulted(fault)
    }

    // =========================================================================
    // Forced actions
    // =========================================================================

    /// Puts a forced action at the front of its actor's queue and dispatches it.
    pub(super) fn run_forced(&mut self, action: Action) -> Option<Outcome> {
        let id = action.actor();
        let battler = self.roster.get_mut(id)?;
        battler.queue.push(action, true);
        self.dispatch_one(id)
    }

    /// Runs forced actions requested by effects until none are left or the
    /// chain limit is hit.
    pub(super) fn drain_forced(&mut self) {
        let mut chained = 0;
        while let Some(action) = self.forced.pop_front() {
            let id = action.actor();
            if chained == MAX_FORCED_CHAIN {
                let dropped = self.forced.len() + 1;
                warn!(tick = self.tick, battler = %id, dropped, "forced action chain limit reached");
                self.outcomes.push((id, Outcome::Faulted(Fault::ForcedChainLimit)));
                self.forced.clear();
                return;
            }
            chained += 1;

            let Some(battler) = self.roster.get(id).filter(|b| b.is_alive()) else {
                warn!(tick = self.tick, battler = %id, "forced action for a battler not in battle, dropping");
                continue;
            };
            // An interrupted battler takes no further action this tick.
            if battler.result().contains(ResultFlags::INTERRUPTED) {
                warn!(
                    tick = self.tick,
                    battler = %id,
                    usable = %action.usable(),
                    "forced action for a battler interrupted this tick, dropping"
                );
                continue;
            }
            self.run_forced(action);
        }
    }
}
