//! Effect resolution.
//!
//! Runs an action's effect callback against frozen views of its targets, then
//! applies the returned [`Effect`]s one by one. Damage and restrictions go
//! through the interrupt controller here, which is how one battler's action
//! cancels another battler's cast mid-tick.

use tracing::{debug, warn};

use super::BattleSession;
use crate::action::{Action, UsableRef};
use crate::battler::{Battler, BattlerId, ResultFlags, TpbState};
use crate::catalog::ActionDefinition;
use crate::effect::{Effect, EffectContext};
use crate::event::{Journal, Resolution};
use crate::hook::InterruptTrigger;
use crate::roster::Lane;

/// What a single damage application did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Hit {
    pub(super) dealt: u32,
    pub(super) interrupted: bool,
    pub(super) knocked_out: bool,
}

impl BattleSession {
    /// Applies the action's effect to the standing subset of `targets`.
    ///
    /// Targets that left the battle (or were knocked out) are skipped and
    /// counted as missing; the action still resolves.
    pub(super) fn execute(
        &mut self,
        id: BattlerId,
        usable: UsableRef,
        definition: &ActionDefinition,
        targets: &[BattlerId],
    ) -> Resolution {
        let Some(user) = self.roster.get(id).map(Battler::view) else {
            return Resolution::default();
        };

        let mut views = Vec::with_capacity(targets.len());
        let mut missing = 0;
        for target in targets {
            match self.roster.get(*target) {
                Some(battler) if battler.is_alive() => views.push(battler.view()),
                _ => missing += 1,
            }
        }
        if missing > 0 {
            warn!(tick = self.tick, battler = %id, %usable, missing, "targets no longer in battle, skipping them");
        }

        let ctx = EffectContext {
            tick: self.tick,
            user,
            targets: &views,
        };
        let effects = definition.effect.apply(&ctx);

        for view in &views {
            if let Some(battler) = self.roster.get_mut(view.id) {
                battler.result.insert(ResultFlags::USED);
            }
        }

        let mut resolution = Resolution {
            usable: Some(usable),
            targets: views.iter().map(|view| view.id).collect(),
            missing_targets: missing,
            ..Resolution::default()
        };
        for effect in effects {
            self.apply_effect(effect, &mut resolution);
        }

        let user = self.roster.get(id).map_or(user, Battler::view);
        self.hooks
            .notify(|presenter| presenter.action_resolved(&user, &resolution));
        debug!(
            tick = self.tick,
            battler = %id,
            %usable,
            targets = resolution.targets.len(),
            hp_damage = resolution.hp_damage,
            "action resolved"
        );
        resolution
    }

    fn apply_effect(&mut self, effect: Effect, resolution: &mut Resolution) {
        match effect {
            Effect::Damage { target, amount } => {
                if let Some(hit) = self.damage(target, amount) {
                    resolution.hp_damage += hit.dealt;
                    if hit.interrupted {
                        resolution.interrupted.push(target);
                    }
                    if hit.knocked_out {
                        resolution.knocked_out.push(target);
                    }
                }
            }
            Effect::Heal { target, amount } => {
                if let Some(battler) = self.roster.get_mut(target).filter(|b| b.is_alive()) {
                    battler.pools.heal(amount);
                }
            }
            Effect::Restrict { target } => {
                if self.restrict(target) {
                    resolution.interrupted.push(target);
                }
            }
            Effect::Force {
                battler,
                usable,
                target,
            } => {
                let mut action = Action::new(battler, usable, target).forcing();
                action.set_sequence(self.next_sequence());
                self.forced.push_back(action);
            }
        }
    }

    /// Deals damage and runs the damage trigger. Returns `None` if the battler
    /// is not standing.
    pub(super) fn damage(&mut self, id: BattlerId, amount: u32) -> Option<Hit> {
        let battler = self.roster.get_mut(id).filter(|b| b.is_alive())?;
        let dealt = battler.pools.take_damage(amount);
        if dealt > 0 {
            battler.result.insert(ResultFlags::HP_DAMAGE);
        }
        if battler.pools.is_depleted() {
            self.knock_out(id);
            return Some(Hit {
                dealt,
                interrupted: false,
                knocked_out: true,
            });
        }

        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        let interrupted = self.interrupts.on_trigger(
            &mut self.roster,
            &mut journal,
            &mut self.outcomes,
            id,
            &InterruptTrigger::Damage { amount: dealt },
        );
        Some(Hit {
            dealt,
            interrupted,
            knocked_out: false,
        })
    }

    /// Restricts a standing battler: its cast is interrupted first, then its
    /// queued actions are dropped. Returns true if a cast was interrupted.
    pub(super) fn restrict(&mut self, id: BattlerId) -> bool {
        let Some(battler) = self.roster.get_mut(id).filter(|b| b.is_alive()) else {
            return false;
        };
        battler.restricted = true;

        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        let interrupted = self.interrupts.on_trigger(
            &mut self.roster,
            &mut journal,
            &mut self.outcomes,
            id,
            &InterruptTrigger::Restriction,
        );

        // A cast no hook cancelled keeps its action; it resumes once lifted.
        if let Some(battler) = self.roster.get_mut(id) {
            if battler.state() != TpbState::Casting {
                battler.queue.clear();
            }
        }
        debug!(tick = self.tick, battler = %id, interrupted, "restriction applied");
        interrupted
    }

    /// Takes a battler out of the fight for good.
    fn knock_out(&mut self, id: BattlerId) {
        let Some(battler) = self.roster.get_mut(id) else {
            return;
        };
        battler.knocked_out = true;
        let dropped = battler.queue.clear();
        battler.clear_counters(true);

        let mut journal = Journal {
            tick: self.tick,
            log: &mut self.events,
            hooks: &self.hooks,
        };
        journal.transition(battler, TpbState::Done);
        self.roster.move_to(id, Lane::Done);
        self.forced.retain(|action| action.actor() != id);
        debug!(tick = self.tick, battler = %id, dropped, "battler knocked out");
    }
}
