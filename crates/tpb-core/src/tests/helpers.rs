//! Test fixtures: a small skill table, two battler profiles, session builders
//! and a presenter that records every signal it receives.

use std::sync::{Arc, Mutex};

use crate::action::{Action, Relation, TargetSelector, UsableRef};
use crate::battler::{BattlerId, BattlerView, ItemId, ResultFlags, Side};
use crate::catalog::{ActionDefinition, BattlerProfile, MemoryCatalog, ProfileId};
use crate::config::{ChargeRate, SchedulerConfig};
use crate::effect::{ActionEffect, Effect, EffectContext, Mend, NoEffect, Restrain, Strike};
use crate::event::{InterruptCause, Resolution, StepReport, TransitionEvent};
use crate::hook::Presenter;
use crate::session::BattleSession;

// =============================================================================
// Fixture Data
// =============================================================================

/// Instant, free, 10 damage.
pub const STRIKE: UsableRef = UsableRef::Skill(1);
/// 20-tick cast, 5 MP, 30 damage.
pub const FIREBALL: UsableRef = UsableRef::Skill(2);
/// Same as `FIREBALL` with no cast time.
pub const QUICK_FIRE: UsableRef = UsableRef::Skill(3);
/// Instant restriction.
pub const STUN: UsableRef = UsableRef::Skill(4);
/// Negative delay and cost from a broken formula.
pub const BROKEN: UsableRef = UsableRef::Skill(5);
/// Instant, 5 damage, and every target strikes back.
pub const RIPOSTE: UsableRef = UsableRef::Skill(6);
/// Forces its user to use it again, forever.
pub const ECHO: UsableRef = UsableRef::Skill(7);
/// Instant, 45 MP, no effect.
pub const DRAIN: UsableRef = UsableRef::Skill(8);
/// Instant, 80 MP, no effect. Nobody can afford it.
pub const METEOR: UsableRef = UsableRef::Skill(9);
/// Instant, free, 999 damage.
pub const SMITE: UsableRef = UsableRef::Skill(10);
/// Not in the table.
pub const UNKNOWN: UsableRef = UsableRef::Skill(99);

/// Consumable healing item.
pub const POTION: ItemId = ItemId::new(1);

/// Speed 10, 200 HP, 50 MP.
pub const HERO: ProfileId = ProfileId(1);
/// Speed 5, 100 HP, 20 MP.
pub const SLIME: ProfileId = ProfileId(2);

/// Deals 5 damage and makes every target strike the user back.
struct Riposte;

impl ActionEffect for Riposte {
    fn apply(&self, ctx: &EffectContext<'_>) -> Vec<Effect> {
        ctx.targets
            .iter()
            .flat_map(|target| {
                [
                    Effect::Damage {
                        target: target.id,
                        amount: 5,
                    },
                    Effect::Force {
                        battler: target.id,
                        usable: STRIKE,
                        target: TargetSelector::Battler(ctx.user.id),
                    },
                ]
            })
            .collect()
    }
}

/// Forces the user to use `ECHO` again.
struct Echo;

impl ActionEffect for Echo {
    fn apply(&self, ctx: &EffectContext<'_>) -> Vec<Effect> {
        vec![Effect::Force {
            battler: ctx.user.id,
            usable: ECHO,
            target: TargetSelector::User,
        }]
    }
}

/// Builds the fixture tables.
pub fn catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.insert_profile(
        HERO,
        BattlerProfile {
            name: "Hero".into(),
            speed: 10,
            max_hp: 200,
            max_mp: 50,
            max_tp: 100,
        },
    );
    catalog.insert_profile(
        SLIME,
        BattlerProfile {
            name: "Slime".into(),
            speed: 5,
            max_hp: 100,
            max_mp: 20,
            max_tp: 0,
        },
    );

    let strike = || Arc::new(Strike { amount: 30 });
    catalog.insert_action(STRIKE, ActionDefinition::instant(Arc::new(Strike { amount: 10 })));
    catalog.insert_action(
        FIREBALL,
        ActionDefinition::instant(strike()).with_cast_delay(20).with_mp_cost(5),
    );
    catalog.insert_action(QUICK_FIRE, ActionDefinition::instant(strike()).with_mp_cost(5));
    catalog.insert_action(STUN, ActionDefinition::instant(Arc::new(Restrain)));
    catalog.insert_action(
        BROKEN,
        ActionDefinition::instant(Arc::new(Strike { amount: 1 }))
            .with_cast_delay(-5)
            .with_mp_cost(-3),
    );
    catalog.insert_action(RIPOSTE, ActionDefinition::instant(Arc::new(Riposte)));
    catalog.insert_action(ECHO, ActionDefinition::instant(Arc::new(Echo)));
    catalog.insert_action(DRAIN, ActionDefinition::instant(Arc::new(NoEffect)).with_mp_cost(45));
    catalog.insert_action(METEOR, ActionDefinition::instant(Arc::new(NoEffect)).with_mp_cost(80));
    catalog.insert_action(SMITE, ActionDefinition::instant(Arc::new(Strike { amount: 999 })));
    catalog.insert_action(
        UsableRef::Item(POTION),
        ActionDefinition::instant(Arc::new(Mend { amount: 20 }))
            .with_cast_delay(5)
            .consumable(),
    );
    catalog
}

// =============================================================================
// Session Setup
// =============================================================================

/// Configuration where every battler is ready on the first tick.
pub fn instant_config() -> SchedulerConfig {
    SchedulerConfig {
        charge_rate: ChargeRate::Fixed(SchedulerConfig::DEFAULT_CHARGE_THRESHOLD),
        ..SchedulerConfig::default()
    }
}

/// Creates an empty session over the fixture tables.
pub fn session(config: SchedulerConfig) -> BattleSession {
    let catalog = Arc::new(catalog());
    BattleSession::new(config, catalog.clone(), catalog).unwrap()
}

/// Creates a session with a hero on the ally side and a slime opposing it.
///
/// # Returns
///
/// A tuple of (session, hero_id, slime_id).
pub fn duel(config: SchedulerConfig) -> (BattleSession, BattlerId, BattlerId) {
    let mut session = session(config);
    let hero = session.enlist(Side::Ally, HERO).unwrap();
    let slime = session.enlist(Side::Opponent, SLIME).unwrap();
    (session, hero, slime)
}

/// Queues `usable` from `actor` at `target`.
pub fn queue_at(session: &mut BattleSession, actor: BattlerId, usable: UsableRef, target: BattlerId) {
    session
        .queue_action(Action::new(actor, usable, TargetSelector::Battler(target)))
        .unwrap();
}

/// Queues `usable` from `actor` at every opponent.
pub fn queue_at_opponents(session: &mut BattleSession, actor: BattlerId, usable: UsableRef) {
    session
        .queue_action(Action::new(actor, usable, TargetSelector::Side(Relation::Opponents)))
        .unwrap();
}

/// Steps `count` times and returns every report.
pub fn run(session: &mut BattleSession, count: usize) -> Vec<StepReport> {
    (0..count).map(|_| session.step()).collect()
}

/// Returns the HP of a battler.
pub fn hp(session: &BattleSession, id: BattlerId) -> u32 {
    session.battler(id).unwrap().pools().hp
}

/// Returns the MP of a battler.
pub fn mp(session: &BattleSession, id: BattlerId) -> u32 {
    session.battler(id).unwrap().pools().mp
}

// =============================================================================
// Recording Presenter
// =============================================================================

/// A presentation signal as received by [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A transition event.
    Transition(TransitionEvent),
    /// "cast started"
    CastStarted {
        /// Caster
        battler: BattlerId,
        /// Skill or item
        usable: UsableRef,
        /// Cast delay
        delay: u32,
    },
    /// "action interrupted"
    Interrupted {
        /// Interrupted caster
        battler: BattlerId,
        /// What cancelled the cast
        cause: InterruptCause,
        /// Whether the caster was also hit this tick
        was_hit: bool,
    },
    /// "action resolved"
    Resolved {
        /// Actor
        battler: BattlerId,
        /// Effect summary
        resolution: Resolution,
    },
}

/// Presenter that keeps every signal in arrival order.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    signals: Mutex<Vec<Signal>>,
}

impl RecordingPresenter {
    /// Returns a copy of the recorded signals.
    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().unwrap().clone()
    }

    fn push(&self, signal: Signal) {
        self.signals.lock().unwrap().push(signal);
    }
}

impl Presenter for RecordingPresenter {
    fn transition(&self, event: &TransitionEvent) {
        self.push(Signal::Transition(event.clone()));
    }

    fn cast_started(&self, battler: &BattlerView, usable: UsableRef, delay: u32) {
        self.push(Signal::CastStarted {
            battler: battler.id,
            usable,
            delay,
        });
    }

    fn action_interrupted(&self, battler: &BattlerView, cause: &InterruptCause, flags: ResultFlags) {
        self.push(Signal::Interrupted {
            battler: battler.id,
            cause: cause.clone(),
            was_hit: flags.contains(ResultFlags::USED),
        });
    }

    fn action_resolved(&self, battler: &BattlerView, resolution: &Resolution) {
        self.push(Signal::Resolved {
            battler: battler.id,
            resolution: resolution.clone(),
        });
    }
}

/// Registers a fresh recording presenter on the session.
pub fn record(session: &mut BattleSession) -> Arc<RecordingPresenter> {
    let recorder = Arc::new(RecordingPresenter::default());
    session.hooks_mut().register_presenter(recorder.clone());
    recorder
}
