//! Error types for session commands.
//!
//! The dispatch loop itself is total: faults inside a step surface as
//! [`Outcome::Faulted`](crate::event::Outcome::Faulted) values, never as errors.
//! The types here cover the commands a caller issues against a session.

use crate::battler::BattlerId;
use crate::catalog::ProfileId;

/// Invalid scheduler configuration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No battler could ever become ready.
    #[error("charge threshold must be greater than zero")]
    ZeroThreshold,
    /// No cast could ever complete.
    #[error("cast rate must be greater than zero")]
    ZeroCastRate,
    /// No battler would ever gain charge.
    #[error("fixed charge rate must be greater than zero")]
    ZeroChargeRate,
    /// Turn boundaries would reset a battler's charge before it could ever
    /// reach the threshold.
    #[error(
        "turn length {turn_length} is too short: a battler gaining {min_rate} charge per tick \
         never reaches the threshold of {threshold} before its charge is reset"
    )]
    TurnTooShort {
        /// Configured ticks per turn
        turn_length: u32,
        /// Slowest charge gain per tick the configuration allows
        min_rate: u32,
        /// Charge needed to become ready
        threshold: u32,
    },
}

/// Errors returned by [`BattleSession`](crate::session::BattleSession) commands.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The battler is not (or no longer) part of the battle.
    #[error("battler {0} is not in battle")]
    UnknownBattler(BattlerId),
    /// The battler data table has no such profile.
    #[error("no battler profile {0:?}")]
    UnknownProfile(ProfileId),
    /// The battler has been knocked out.
    #[error("battler {0} is knocked out")]
    KnockedOut(BattlerId),
    /// The battler is restricted and cannot take commands.
    #[error("battler {0} is restricted")]
    Restricted(BattlerId),
    /// The session configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
