//! Effect callbacks and the effect outputs they emit.
//!
//! Action effects never mutate the battle directly. An [`ActionEffect`] reads a
//! frozen [`EffectContext`] (actor and targets as [`BattlerView`]s) and returns
//! a list of [`Effect`]s. The session applies those outputs in order after the
//! callback returns, which is where damage may trigger interrupts on other
//! battlers and where forced follow-up actions are queued.
//!
//! # Example
//!
//! ```
//! use tpb_core::effect::{ActionEffect, Effect, EffectContext, Strike};
//! use tpb_core::battler::{Battler, BattlerId, ResourcePools, Side};
//!
//! let user = Battler::new(BattlerId::new(0), Side::Ally, 0, 1, ResourcePools::full(10, 0, 0)).view();
//! let foe = Battler::new(BattlerId::new(1), Side::Opponent, 0, 1, ResourcePools::full(10, 0, 0)).view();
//! let targets = [foe];
//! let ctx = EffectContext { tick: 1, user, targets: &targets };
//!
//! let outputs = Strike { amount: 4 }.apply(&ctx);
//! assert_eq!(outputs, vec![Effect::Damage { target: BattlerId::new(1), amount: 4 }]);
//! ```

use serde::{Deserialize, Serialize};

use crate::action::{TargetSelector, UsableRef};
use crate::battler::{BattlerId, BattlerView};

/// A state change proposed by an effect callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Remove HP from a battler.
    Damage {
        /// Battler hit
        target: BattlerId,
        /// HP to remove
        amount: u32,
    },
    /// Restore HP to a battler.
    Heal {
        /// Battler healed
        target: BattlerId,
        /// HP to restore
        amount: u32,
    },
    /// Apply an action-preventing restriction (stun, sleep, ...).
    Restrict {
        /// Battler restricted
        target: BattlerId,
    },
    /// Inject a forced action (counter-attack, event-triggered action).
    Force {
        /// Battler that performs the forced action
        battler: BattlerId,
        /// Skill or item used
        usable: UsableRef,
        /// Target selection of the forced action
        target: TargetSelector,
    },
}

impl Effect {
    /// Returns the battler this effect is applied to.
    #[must_use]
    pub const fn subject(&self) -> BattlerId {
        match self {
            Self::Damage { target, .. } | Self::Heal { target, .. } | Self::Restrict { target } => {
                *target
            }
            Self::Force { battler, .. } => *battler,
        }
    }
}

/// Frozen view an effect callback runs against.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    /// Tick the action resolves on.
    pub tick: u64,
    /// The acting battler.
    pub user: BattlerView,
    /// Standing targets, in resolution order.
    pub targets: &'a [BattlerView],
}

/// Effect callback of a skill or item.
pub trait ActionEffect: Send + Sync {
    /// Returns the state changes this action causes.
    fn apply(&self, ctx: &EffectContext<'_>) -> Vec<Effect>;
}

/// Effect that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffect;

impl ActionEffect for NoEffect {
    fn apply(&self, _ctx: &EffectContext<'_>) -> Vec<Effect> {
        Vec::new()
    }
}

/// Fixed HP damage to every target.
#[derive(Debug, Clone, Copy)]
pub struct Strike {
    /// Damage dealt to each target.
    pub amount: u32,
}

impl ActionEffect for Strike {
    fn apply(&self, ctx: &EffectContext<'_>) -> Vec<Effect> {
        ctx.targets
            .iter()
            .map(|target| Effect::Damage {
                target: target.id,
                amount: self.amount,
            })
            .collect()
    }
}

/// Fixed HP healing to every target.
#[derive(Debug, Clone, Copy)]
pub struct Mend {
    /// HP restored to each target.
    pub amount: u32,
}

impl ActionEffect for Mend {
    fn apply(&self, ctx: &EffectContext<'_>) -> Vec<Effect> {
        ctx.targets
            .iter()
            .map(|target| Effect::Heal {
                target: target.id,
                amount: self.amount,
            })
            .collect()
    }
}

/// Restriction applied to every target.
#[derive(Debug, Clone, Copy, Default)]
pub struct Restrain;

impl ActionEffect for Restrain {
    fn apply(&self, ctx: &EffectContext<'_>) -> Vec<Effect> {
        ctx.targets
            .iter()
            .map(|target| Effect::Restrict { target: target.id })
            .collect()
    }
}
