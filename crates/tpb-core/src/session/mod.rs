//! Battle session: caller-owned battle state and the commands against it.
//!
//! A [`BattleSession`] owns everything a battle needs: the roster and its
//! dispatch lanes, side inventories, the hook registry, the event log and the
//! seeded RNG. There is no global battle manager; the caller holds the
//! session and drives it one tick at a time with [`BattleSession::step`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tpb_core::action::{Action, Relation, TargetSelector, UsableRef};
//! use tpb_core::battler::{Side, TpbState};
//! use tpb_core::catalog::{ActionDefinition, BattlerProfile, MemoryCatalog, ProfileId};
//! use tpb_core::config::{ChargeRate, SchedulerConfig};
//! use tpb_core::effect::Strike;
//! use tpb_core::session::BattleSession;
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog.insert_profile(ProfileId(1), BattlerProfile {
//!     name: "Knight".into(), speed: 10, max_hp: 100, max_mp: 10, max_tp: 0,
//! });
//! catalog.insert_action(
//!     UsableRef::Skill(1),
//!     ActionDefinition::instant(Arc::new(Strike { amount: 12 })).with_cast_delay(3).with_mp_cost(4),
//! );
//! let catalog = Arc::new(catalog);
//!
//! let config = SchedulerConfig { charge_rate: ChargeRate::Fixed(100), ..SchedulerConfig::default() };
//! let mut session = BattleSession::new(config, catalog.clone(), catalog).unwrap();
//! let knight = session.enlist(Side::Ally, ProfileId(1)).unwrap();
//! let rival = session.enlist(Side::Opponent, ProfileId(1)).unwrap();
//!
//! session
//!     .queue_action(Action::new(knight, UsableRef::Skill(1), TargetSelector::Side(Relation::Opponents)))
//!     .unwrap();
//!
//! session.step(); // ready and starts casting
//! assert_eq!(session.battler(knight).unwrap().state(), TpbState::Casting);
//!
//! for _ in 0..3 {
//!     session.step();
//! }
//! assert_eq!(session.battler(rival).unwrap().pools().hp, 88);
//! assert_eq!(session.battler(knight).unwrap().pools().mp, 6);
//! ```

mod dispatch;
mod resolve;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::action::Action;
use crate::battler::{Battler, BattlerId, Inventories, Inventory, ResourcePools, Side, TpbState};
use crate::catalog::{ActionCatalog, BattlerData, ProfileId};
use crate::clock::ReadinessClock;
use crate::config::SchedulerConfig;
use crate::error::SessionError;
use crate::event::{EventLog, InterruptCause, Journal, Outcome, TransitionEvent};
use crate::hook::HookRegistry;
use crate::interrupt::InterruptController;
use crate::roster::{Lane, Roster};

/// Maximum number of forced actions that may chain off each other in one
/// dispatch. Anything beyond is dropped with [`Fault::ForcedChainLimit`].
///
/// [`Fault::ForcedChainLimit`]: crate::event::Fault::ForcedChainLimit
pub const MAX_FORCED_CHAIN: usize = 64;

/// Display-oriented status of one battler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattlerStatus {
    /// Readiness state.
    pub state: TpbState,
    /// Dispatch lane.
    pub lane: Lane,
    /// Ticks left in the current state (0 when ready, acting or done).
    pub remaining_ticks: u32,
    /// Completed fraction of the current cast, while casting.
    pub cast_progress: Option<f32>,
}

/// A running battle.
pub struct BattleSession {
    config: SchedulerConfig,
    clock: ReadinessClock,
    interrupts: InterruptController,
    roster: Roster,
    inventories: Inventories,
    data: Arc<dyn BattlerData>,
    catalog: Arc<dyn ActionCatalog>,
    hooks: HookRegistry,
    events: EventLog,
    outcomes: Vec<(BattlerId, Outcome)>,
    forced: VecDeque<Action>,
    rng: ChaCha8Rng,
    tick: u64,
    next_sequence: u64,
}

impl fmt::Debug for BattleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BattleSession")
            .field("tick", &self.tick)
            .field("config", &self.config)
            .field("roster", &self.roster)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl BattleSession {
    /// Creates an empty session.
    ///
    /// The hook registry starts with the built-in interrupt hooks selected by
    /// the configuration; more can be added through [`hooks_mut`](Self::hooks_mut).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn new(
        config: SchedulerConfig,
        data: Arc<dyn BattlerData>,
        catalog: Arc<dyn ActionCatalog>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            clock: ReadinessClock::new(&config),
            interrupts: InterruptController::new(&config),
            hooks: HookRegistry::with_defaults(&config),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            roster: Roster::new(),
            inventories: Inventories::default(),
            data,
            catalog,
            events: EventLog::new(),
            outcomes: Vec::new(),
            forced: VecDeque::new(),
            tick: 0,
            next_sequence: 0,
        })
    }

    // =========================================================================
    // Roster commands
    // =========================================================================

    /// Adds a battler built from a profile to a side. It starts charging with
    /// full pools.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownProfile`] if the battler data table has no
    /// such profile.
    pub fn enlist(&mut self, side: Side, profile: ProfileId) -> Result<BattlerId, SessionError> {
        let profile_data = self
            .data
            .profile(profile)
            .ok_or(SessionError::UnknownProfile(profile))?;
        if profile_data.speed == 0 {
            warn!(?profile, name = %profile_data.name, "profile has zero speed, charging at minimum rate");
        }
        let pools = ResourcePools::full(profile_data.max_hp, profile_data.max_mp, profile_data.max_tp);
        let id = self.roster.insert(side, profile_data.speed, pools);
        debug!(battler = %id, %side, name = %profile_data.name, "battler enlisted");
        Ok(id)
    }

    /// Removes a battler from the battle. Actions still aimed at it resolve
    /// without effect on it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownBattler`] if the battler is not in battle.
    pub fn withdraw(&mut self, id: BattlerId) -> Result<Battler, SessionError> {
        let battler = self.roster.remove(id).ok_or(SessionError::UnknownBattler(id))?;
        self.forced.retain(|action| action.actor() != id);
        debug!(battler = %id, "battler withdrawn");
        Ok(battler)
    }

    // =========================================================================
    // Action commands
    // =========================================================================

    /// Appends an action to its actor's queue. It is dispatched once the actor
    /// is ready. Forcing actions are routed to [`force_action`](Self::force_action)
    /// and run at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not in battle, knocked out or
    /// restricted.
    pub fn queue_action(&mut self, mut action: Action) -> Result<(), SessionError> {
        let id = action.actor();
        if self.standing(id)?.is_restricted() {
            return Err(SessionError::Restricted(id));
        }
        if action.is_forcing() {
            self.force_action(action)?;
            return Ok(());
        }
        action.set_sequence(self.next_sequence());
        if let Some(battler) = self.roster.get_mut(id) {
            battler.queue.push(action, false);
        }
        Ok(())
    }

    /// Injects a forced action ahead of the actor's queue and runs it now,
    /// regardless of the actor's readiness or cast in progress.
    ///
    /// Forced follow-ups requested by its effect run before this returns.
    /// The outcome is also listed in the `between_steps` of the next
    /// [`StepReport`](crate::event::StepReport).
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not in battle or knocked out.
    pub fn force_action(&mut self, action: Action) -> Result<Outcome, SessionError> {
        let id = action.actor();
        self.standing(id)?;
        let mut action = action.forcing();
        action.set_sequence(self.next_sequence());
        let outcome = self.run_forced(action).ok_or(SessionError::UnknownBattler(id))?;
        self.drain_forced();
        Ok(outcome)
    }

    // =========================================================================
    // External state changes
    // =========================================================================

    /// Deals HP damage from outside any action (traps, slip damage).
    ///
    /// Returns true if the damage interrupted a cast. The interruption is
    /// listed in the `between_steps` of the next step's report.
    ///
    /// # Errors
    ///
    /// Returns an error if the battler is not in battle or knocked out.
    pub fn apply_damage(&mut self, id: BattlerId, amount: u32) -> Result<bool, SessionError> {
        self.standing(id)?;
        Ok(self.damage(id, amount).is_some_and(|hit| hit.interrupted))
    }

    /// Applies an action-preventing restriction. A cast in progress is
    /// interrupted, then queued actions are dropped.
    ///
    /// Returns true if a cast was interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if the battler is not in battle or knocked out.
    pub fn apply_restriction(&mut self, id: BattlerId) -> Result<bool, SessionError> {
        self.standing(id)?;
        Ok(self.restrict(id))
    }

    /// Lifts a restriction so the battler can be dispatched again.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownBattler`] if the battler is not in battle.
    pub fn lift_restriction(&mut self, id: BattlerId) -> Result<(), SessionError> {
        let battler = self.roster.get_mut(id).ok_or(SessionError::UnknownBattler(id))?;
        battler.restricted = false;
        Ok(())
    }

    /// Interrupts the battler's cast directly, bypassing the hook pipeline.
    ///
    /// Returns false if the battler was not casting.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownBattler`] if the battler is not in battle.
    pub fn interrupt(&mut self, id: BattlerId) -> Result<bool, SessionError> {
        if !self.roster.contains(id) {
            return Err(SessionError::UnknownBattler(id));
        }
        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        Ok(self.interrupts.interrupt(
            &mut self.roster,
            &mut journal,
            &mut self.outcomes,
            id,
            InterruptCause::Direct,
        ))
    }

    /// Applies a turn boundary. Battlers still accruing charge lose it unless
    /// `reset_on_turn_end` is off; ready, casting and done battlers are left
    /// alone.
    ///
    /// Returns the number of battlers whose charge was reset. Called
    /// automatically every `turn_length` ticks when that is non-zero.
    pub fn end_turn(&mut self) -> usize {
        if !self.config.reset_on_turn_end {
            debug!(tick = self.tick, "turn ended, charge kept");
            return 0;
        }
        let mut reset = 0;
        for id in self.roster.in_lane(Lane::Charging) {
            if let Some(battler) = self.roster.get_mut(id) {
                if battler.charge_time > 0 {
                    battler.charge_time = 0;
                    reset += 1;
                }
            }
        }
        debug!(tick = self.tick, reset, "turn ended");
        reset
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the number of completed steps.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns a battler.
    #[must_use]
    pub fn battler(&self, id: BattlerId) -> Option<&Battler> {
        self.roster.get(id)
    }

    /// Iterates over all battlers in id order.
    pub fn battlers(&self) -> impl Iterator<Item = &Battler> + '_ {
        self.roster.iter()
    }

    /// Returns the roster and its lanes.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Returns state, remaining ticks and cast progress of a battler.
    #[must_use]
    pub fn status(&self, id: BattlerId) -> Option<BattlerStatus> {
        let battler = self.roster.get(id)?;
        Some(BattlerStatus {
            state: battler.state(),
            lane: self.roster.lane_of(id).unwrap_or_default(),
            remaining_ticks: self.clock.remaining_ticks(battler),
            cast_progress: self.clock.cast_progress(battler),
        })
    }

    /// Returns ready battlers that have nothing queued, in ready order.
    #[must_use]
    pub fn pending_input(&self) -> Vec<BattlerId> {
        self.roster
            .ready_order()
            .into_iter()
            .filter(|id| {
                self.roster.get(*id).is_some_and(|b| {
                    b.is_alive() && !b.is_restricted() && b.queue().is_empty()
                })
            })
            .collect()
    }

    /// Returns true if no battler of `side` is standing.
    #[must_use]
    pub fn is_side_defeated(&self, side: Side) -> bool {
        self.roster.members(side).is_empty()
    }

    /// Returns a side's inventory.
    #[must_use]
    pub const fn inventory(&self, side: Side) -> &Inventory {
        self.inventories.for_side(side)
    }

    /// Returns a side's inventory mutably, for stocking items.
    pub fn inventory_mut(&mut self, side: Side) -> &mut Inventory {
        self.inventories.for_side_mut(side)
    }

    /// Returns the hook registry.
    #[must_use]
    pub const fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Returns the hook registry mutably, for registering hooks at setup.
    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    /// Returns the transition events recorded since the last drain.
    #[must_use]
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drains recorded transition events.
    pub fn take_events(&mut self) -> Vec<TransitionEvent> {
        self.events.take_events()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    /// Returns the battler if it can take commands at all.
    fn standing(&self, id: BattlerId) -> Result<&Battler, SessionError> {
        let battler = self.roster.get(id).ok_or(SessionError::UnknownBattler(id))?;
        if !battler.is_alive() {
            return Err(SessionError::KnockedOut(id));
        }
        Ok(battler)
    }
}
