//! # TPB Core
//!
//! Time-progress battle scheduler with cast times and interrupts.
//!
//! Battlers accrue readiness every tick; once ready, their queued action is
//! dispatched through a cast-time gate that may hold it for a delay before its
//! effect applies. Casts in progress can be interrupted by damage, restrictions
//! or direct command, and forced actions can cut ahead of everything.
//!
//! ## Architecture
//!
//! - **Readiness clock** ([`clock`]): per-battler charge and cast progress
//! - **Action queue** ([`action`]): per-battler pending actions with a target
//!   snapshot and a one-shot "cost paid" flag
//! - **Cast-time gate** ([`gate`]): `charging → casting → acting → done`
//! - **Interrupt controller** ([`interrupt`]): cancels casts through the
//!   ordered hook pipeline of [`hook`]
//! - **Turn dispatcher** ([`session`]): the per-tick loop over the ready lane
//!   of the [`roster`]
//!
//! Game data is consumed read-only through the traits in [`catalog`]; effect
//! callbacks ([`effect`]) return state changes instead of mutating the battle.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tpb_core::{BattleSession, SchedulerConfig};
//!
//! let mut session = BattleSession::new(SchedulerConfig::default(), data, catalog)?;
//! let hero = session.enlist(Side::Ally, ProfileId(1))?;
//! session.queue_action(Action::new(hero, UsableRef::Skill(3), TargetSelector::Side(Relation::Opponents)))?;
//! loop {
//!     let report = session.step();
//!     // render report.outcomes and session.take_events()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod battler;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod effect;
pub mod error;
pub mod event;
pub mod gate;
pub mod hook;
pub mod interrupt;
pub mod roster;
pub mod session;

#[cfg(test)]
mod tests;

pub use action::{Action, ActionQueue, Relation, TargetSelector, UsableRef};
pub use battler::{Battler, BattlerId, BattlerView, ResultFlags, Side, TpbState};
pub use catalog::{ActionCatalog, ActionDefinition, BattlerData, MemoryCatalog, ProfileId};
pub use config::{ChargeRate, SchedulerConfig};
pub use error::{ConfigError, SessionError};
pub use event::{Outcome, StepReport, TransitionEvent};
pub use hook::{HookRegistry, InterruptHook, Presenter};
pub use session::{BattleSession, BattlerStatus};
