//! Transition events and dispatch outcomes.
//!
//! Two kinds of records leave the scheduler:
//!
//! - [`TransitionEvent`]: emitted exactly once per readiness state change,
//!   recorded in the session's [`EventLog`] and mirrored to presenters
//! - [`Outcome`]: the explicit status value of a dispatch, forced action or
//!   interrupt, collected per step into a [`StepReport`]; outcomes of
//!   commands issued between steps are kept apart from the tick's own
//!
//! Expected cancellation is a value (`Outcome::Interrupted`), not an error.
//!
//! # Example
//!
//! ```
//! use tpb_core::event::{EventLog, TransitionEvent};
//! use tpb_core::battler::{BattlerId, ResultFlags, TpbState};
//!
//! let mut log = EventLog::new();
//! log.record(TransitionEvent {
//!     tick: 1,
//!     battler: BattlerId::new(0),
//!     from: TpbState::Charging,
//!     to: TpbState::Casting,
//!     flags: ResultFlags::empty(),
//! });
//!
//! let events = log.take_events();
//! assert_eq!(events.len(), 1);
//! assert!(log.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::action::UsableRef;
use crate::battler::{Battler, BattlerId, ResultFlags, TpbState};
use crate::hook::HookRegistry;

// =============================================================================
// Transition events
// =============================================================================

/// A readiness state change of one battler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Tick the transition happened on.
    pub tick: u64,
    /// Battler that changed state.
    pub battler: BattlerId,
    /// State before the transition.
    pub from: TpbState,
    /// State after the transition.
    pub to: TpbState,
    /// Result flags of the battler at transition time.
    pub flags: ResultFlags,
}

/// Append-only record of transition events, drained by the caller.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<TransitionEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&mut self, event: TransitionEvent) {
        self.events.push(event);
    }

    /// Drains and returns all recorded events in emission order.
    pub fn take_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterates over recorded events without draining them.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionEvent> + '_ {
        self.events.iter()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Applies state changes and emits their events.
///
/// Every state change inside the crate goes through [`Journal::transition`],
/// which is what guarantees one event per transition.
pub(crate) struct Journal<'a> {
    pub(crate) tick: u64,
    pub(crate) log: &'a mut EventLog,
    pub(crate) hooks: &'a HookRegistry,
}

impl Journal<'_> {
    /// Moves `battler` to `to`. Returns false (and emits nothing) if it was
    /// already there.
    pub(crate) fn transition(&mut self, battler: &mut Battler, to: TpbState) -> bool {
        let from = battler.set_state(to);
        if from == to {
            return false;
        }
        let event = TransitionEvent {
            tick: self.tick,
            battler: battler.id(),
            from,
            to,
            flags: battler.result(),
        };
        self.hooks.notify(|presenter| presenter.transition(&event));
        self.log.record(event);
        true
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Why a dispatch could not run its action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    /// The action catalog has no definition for the skill or item.
    UnknownUsable(UsableRef),
    /// The cost was unpaid and the battler cannot afford it.
    InsufficientResources,
    /// Too many forced actions were chained within one tick.
    ForcedChainLimit,
}

/// What cut a cast short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptCause {
    /// A registered interrupt hook cancelled the cast.
    Hook(String),
    /// The session's `interrupt` command was called directly.
    Direct,
}

/// Effect summary of a resolved action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The skill or item used.
    pub usable: Option<UsableRef>,
    /// Targets the effect was applied to.
    pub targets: Vec<BattlerId>,
    /// Targets that were no longer in battle and were skipped.
    pub missing_targets: usize,
    /// Total HP removed by damage effects.
    pub hp_damage: u32,
    /// Battlers whose casts this action interrupted.
    pub interrupted: Vec<BattlerId>,
    /// Battlers this action knocked out.
    pub knocked_out: Vec<BattlerId>,
}

/// Status value returned by every scheduler transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A delayed action entered its cast; it resolves `ready_in` ticks later.
    CastStarted {
        /// Ticks until the cast completes
        ready_in: u32,
    },
    /// The action's effect was applied.
    Resolved(Resolution),
    /// An in-flight cast was cancelled.
    Interrupted {
        /// What cancelled it
        cause: InterruptCause,
    },
    /// The action could not run; the battler still finished its turn.
    Faulted(Fault),
}

impl Outcome {
    /// Returns true for `Resolved`.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns the resolution summary, if resolved.
    #[must_use]
    pub const fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Resolved(resolution) => Some(resolution),
            _ => None,
        }
    }
}

/// Everything that happened up to and including one tick.
///
/// `outcomes` holds what the step itself produced. Commands issued after the
/// previous step (forced actions, external damage, direct interrupts) ran on
/// the previous tick; their outcomes are kept apart in `between_steps` so they
/// are never labelled with this report's tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Tick this report closes.
    pub tick: u64,
    /// Outcomes of commands issued between the previous step and this one,
    /// in the order they happened. They belong to tick `tick - 1`.
    pub between_steps: Vec<(BattlerId, Outcome)>,
    /// Outcomes produced during this tick, in the order they happened.
    pub outcomes: Vec<(BattlerId, Outcome)>,
}

impl StepReport {
    /// Returns every outcome this tick produced for a battler.
    pub fn outcomes_for(&self, battler: BattlerId) -> impl Iterator<Item = &Outcome> + '_ {
        filter_battler(&self.outcomes, battler)
    }

    /// Returns every outcome a between-steps command produced for a battler.
    pub fn between_steps_for(&self, battler: BattlerId) -> impl Iterator<Item = &Outcome> + '_ {
        filter_battler(&self.between_steps, battler)
    }

    /// Returns the number of actions resolved during this tick.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_resolved())
            .count()
    }

    /// Returns true if nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.between_steps.is_empty() && self.outcomes.is_empty()
    }
}

fn filter_battler(
    outcomes: &[(BattlerId, Outcome)],
    battler: BattlerId,
) -> impl Iterator<Item = &Outcome> + '_ {
    outcomes
        .iter()
        .filter(move |(id, _)| *id == battler)
        .map(|(_, outcome)| outcome)
}
