//! Hook registry: the ordered interrupt pipeline and presentation hooks.
//!
//! Hooks are registered once at session setup and invoked in registration
//! order. There are two kinds:
//!
//! - [`InterruptHook`]: consulted whenever something happens to a battler that
//!   may cancel its cast ([`InterruptTrigger`]). Every hook runs; the first one
//!   to answer [`HookVerdict::Cancel`] is reported as the cause.
//! - [`Presenter`]: fire-and-forget notifications for the presentation layer
//!   ("cast started", "action interrupted", "action resolved", transitions).
//!   Nothing a presenter does feeds back into scheduling.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tpb_core::battler::BattlerView;
//! use tpb_core::hook::{HookRegistry, HookVerdict, InterruptHook, InterruptTrigger};
//!
//! /// Cancels casts on heavy hits only.
//! struct HeavyHit;
//!
//! impl InterruptHook for HeavyHit {
//!     fn name(&self) -> &str {
//!         "heavy_hit"
//!     }
//!
//!     fn evaluate(&self, trigger: &InterruptTrigger, _battler: &BattlerView) -> HookVerdict {
//!         match trigger {
//!             InterruptTrigger::Damage { amount } if *amount >= 50 => HookVerdict::Cancel,
//!             _ => HookVerdict::Continue,
//!         }
//!     }
//! }
//!
//! let mut hooks = HookRegistry::new();
//! hooks.register_interrupt_hook(Arc::new(HeavyHit));
//! assert_eq!(hooks.interrupt_hook_names(), vec!["heavy_hit"]);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::UsableRef;
use crate::battler::{BattlerView, ResultFlags};
use crate::config::SchedulerConfig;
use crate::event::{InterruptCause, Resolution, TransitionEvent};

// =============================================================================
// Interrupt hooks
// =============================================================================

/// Something that happened to a battler and may cancel its cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptTrigger {
    /// The battler lost HP.
    Damage {
        /// HP actually removed
        amount: u32,
    },
    /// A restriction (stun, sleep, ...) was applied.
    Restriction,
}

/// Answer of an interrupt hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookVerdict {
    /// Let the cast continue.
    Continue,
    /// Cancel the cast.
    Cancel,
}

/// A named step of the interrupt pipeline.
pub trait InterruptHook: Send + Sync {
    /// Name reported as the interrupt cause.
    fn name(&self) -> &str;

    /// Decides whether `trigger` cancels the battler's cast.
    fn evaluate(&self, trigger: &InterruptTrigger, battler: &BattlerView) -> HookVerdict;
}

/// Cancels a cast whenever a restriction is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestrictionInterrupt;

impl InterruptHook for RestrictionInterrupt {
    fn name(&self) -> &str {
        "restriction"
    }

    fn evaluate(&self, trigger: &InterruptTrigger, _battler: &BattlerView) -> HookVerdict {
        match trigger {
            InterruptTrigger::Restriction => HookVerdict::Cancel,
            InterruptTrigger::Damage { .. } => HookVerdict::Continue,
        }
    }
}

/// Cancels a cast whenever HP damage lands.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageInterrupt;

impl InterruptHook for DamageInterrupt {
    fn name(&self) -> &str {
        "damage"
    }

    fn evaluate(&self, trigger: &InterruptTrigger, _battler: &BattlerView) -> HookVerdict {
        match trigger {
            InterruptTrigger::Damage { amount } if *amount > 0 => HookVerdict::Cancel,
            _ => HookVerdict::Continue,
        }
    }
}

// =============================================================================
// Presenters
// =============================================================================

/// Fire-and-forget presentation callbacks.
///
/// All methods default to doing nothing.
#[allow(unused_variables)]
pub trait Presenter: Send + Sync {
    /// A battler changed readiness state.
    fn transition(&self, event: &TransitionEvent) {}

    /// A battler started casting (also called for zero-delay actions when
    /// `announce_instant_casts` is set).
    fn cast_started(&self, battler: &BattlerView, usable: UsableRef, delay: u32) {}

    /// A battler's cast was interrupted. `flags` tells whether it was also hit
    /// by an action this tick.
    fn action_interrupted(&self, battler: &BattlerView, cause: &InterruptCause, flags: ResultFlags) {}

    /// A battler's action (normal or forced) resolved.
    fn action_resolved(&self, battler: &BattlerView, resolution: &Resolution) {}
}

// =============================================================================
// Registry
// =============================================================================

/// Ordered hooks of a session.
#[derive(Clone, Default)]
pub struct HookRegistry {
    interrupt_hooks: Vec<Arc<dyn InterruptHook>>,
    presenters: Vec<Arc<dyn Presenter>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("interrupt_hooks", &self.interrupt_hook_names())
            .field("presenters", &format!("[{} presenters]", self.presenters.len()))
            .finish()
    }
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the registry a session starts with: the restriction hook, plus
    /// the damage hook when `interrupt_on_damage` is set.
    #[must_use]
    pub fn with_defaults(config: &SchedulerConfig) -> Self {
        let mut registry = Self::new();
        registry.register_interrupt_hook(Arc::new(RestrictionInterrupt));
        if config.interrupt_on_damage {
            registry.register_interrupt_hook(Arc::new(DamageInterrupt));
        }
        registry
    }

    /// Appends an interrupt hook to the pipeline.
    pub fn register_interrupt_hook(&mut self, hook: Arc<dyn InterruptHook>) {
        self.interrupt_hooks.push(hook);
    }

    /// Appends a presenter.
    pub fn register_presenter(&mut self, presenter: Arc<dyn Presenter>) {
        self.presenters.push(presenter);
    }

    /// Returns the pipeline's hook names in invocation order.
    #[must_use]
    pub fn interrupt_hook_names(&self) -> Vec<&str> {
        self.interrupt_hooks.iter().map(|hook| hook.name()).collect()
    }

    /// Returns the number of presenters.
    #[must_use]
    pub fn presenter_count(&self) -> usize {
        self.presenters.len()
    }

    /// Runs every interrupt hook in order and returns the name of the first
    /// one that cancelled, if any.
    #[must_use]
    pub fn evaluate(&self, trigger: &InterruptTrigger, battler: &BattlerView) -> Option<String> {
        let mut cancelled_by = None;
        for hook in &self.interrupt_hooks {
            let verdict = hook.evaluate(trigger, battler);
            if verdict == HookVerdict::Cancel && cancelled_by.is_none() {
                cancelled_by = Some(hook.name().to_string());
            }
        }
        cancelled_by
    }

    pub(crate) fn notify(&self, f: impl Fn(&dyn Presenter)) {
        for presenter in &self.presenters {
            f(presenter.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::{Battler, BattlerId, ResourcePools, Side};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn view() -> BattlerView {
        Battler::new(BattlerId::new(0), Side::Ally, 0, 1, ResourcePools::default()).view()
    }

    struct CountingHook {
        name: &'static str,
        verdict: HookVerdict,
        calls: Arc<AtomicUsize>,
    }

    impl InterruptHook for CountingHook {
        fn name(&self) -> &str {
            self.name
        }

        fn evaluate(&self, _trigger: &InterruptTrigger, _battler: &BattlerView) -> HookVerdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict
        }
    }

    #[test]
    fn defaults_follow_config() {
        let plain = HookRegistry::with_defaults(&SchedulerConfig::default());
        assert_eq!(plain.interrupt_hook_names(), vec!["restriction"]);

        let damage = HookRegistry::with_defaults(&SchedulerConfig {
            interrupt_on_damage: true,
            ..SchedulerConfig::default()
        });
        assert_eq!(damage.interrupt_hook_names(), vec!["restriction", "damage"]);
    }

    #[test]
    fn all_hooks_run_and_first_cancel_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::new();
        for (name, verdict) in [
            ("observer", HookVerdict::Continue),
            ("first", HookVerdict::Cancel),
            ("second", HookVerdict::Cancel),
        ] {
            hooks.register_interrupt_hook(Arc::new(CountingHook {
                name,
                verdict,
                calls: Arc::clone(&calls),
            }));
        }

        let cause = hooks.evaluate(&InterruptTrigger::Restriction, &view());
        assert_eq!(cause.as_deref(), Some("first"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn damage_hook_ignores_zero_damage() {
        assert_eq!(
            DamageInterrupt.evaluate(&InterruptTrigger::Damage { amount: 0 }, &view()),
            HookVerdict::Continue
        );
        assert_eq!(
            DamageInterrupt.evaluate(&InterruptTrigger::Damage { amount: 1 }, &view()),
            HookVerdict::Cancel
        );
        assert_eq!(
            RestrictionInterrupt.evaluate(&InterruptTrigger::Damage { amount: 9 }, &view()),
            HookVerdict::Continue
        );
    }
}
