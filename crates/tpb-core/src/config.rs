//! Scheduler configuration.
//!
//! All policy switches of the scheduler live in [`SchedulerConfig`]. Every
//! field has a default, so a partial JSON/RON document deserializes into a
//! complete configuration.
//!
//! # Reset policies
//!
//! Two independent switches govern when partial charge is thrown away:
//!
//! - `reset_on_turn_end`: at a turn boundary, battlers still accruing charge
//!   drop back to zero. Turning this off is the "suppress charge-time reset"
//!   policy: partial progress carries across turns.
//! - `reset_on_interrupt`: an interrupted battler's charge counter is zeroed.
//!   The cast counters are zeroed on interrupt regardless.
//!
//! # Example
//!
//! ```
//! use tpb_core::config::{ChargeRate, SchedulerConfig};
//!
//! let config = SchedulerConfig {
//!     charge_rate: ChargeRate::Fixed(10),
//!     interrupt_on_damage: true,
//!     ..SchedulerConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How much charge a battler gains per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeRate {
    /// Every battler gains the same amount.
    Fixed(u32),
    /// Each battler gains its own speed.
    Speed,
}

/// Policy switches and rates of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Charge needed to become ready.
    pub charge_threshold: u32,
    /// Charge gained per tick.
    pub charge_rate: ChargeRate,
    /// Cast progress gained per tick.
    pub cast_rate: u32,
    /// Ticks per turn boundary; 0 disables automatic boundaries.
    pub turn_length: u32,
    /// Zero charging battlers' charge at a turn boundary.
    pub reset_on_turn_end: bool,
    /// Zero the charge counter of an interrupted battler.
    pub reset_on_interrupt: bool,
    /// HP damage interrupts a cast.
    pub interrupt_on_damage: bool,
    /// Fire the "cast started" signal for zero-delay actions too.
    pub announce_instant_casts: bool,
    /// Seed for random target selection.
    pub seed: u64,
}

impl SchedulerConfig {
    /// Default charge threshold.
    pub const DEFAULT_CHARGE_THRESHOLD: u32 = 100;
    /// Default cast progress per tick.
    pub const DEFAULT_CAST_RATE: u32 = 1;

    /// Checks that the configuration cannot stall a battler.
    ///
    /// With automatic turn boundaries that reset partial charge, every battler
    /// must be able to fill its gauge within one turn. The slowest rate is the
    /// fixed rate, or 1 under `Speed` (zero speed still charges at 1).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the threshold, cast rate or fixed charge
    /// rate is zero, or if resetting turn boundaries come too often for the
    /// slowest battler to ever become ready.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.charge_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.cast_rate == 0 {
            return Err(ConfigError::ZeroCastRate);
        }
        if self.charge_rate == ChargeRate::Fixed(0) {
            return Err(ConfigError::ZeroChargeRate);
        }
        if self.turn_length > 0 && self.reset_on_turn_end {
            let min_rate = self.min_charge_rate();
            if u64::from(min_rate) * u64::from(self.turn_length) < u64::from(self.charge_threshold) {
                return Err(ConfigError::TurnTooShort {
                    turn_length: self.turn_length,
                    min_rate,
                    threshold: self.charge_threshold,
                });
            }
        }
        Ok(())
    }

    /// Returns the smallest charge any battler can gain per tick.
    #[must_use]
    pub const fn min_charge_rate(&self) -> u32 {
        match self.charge_rate {
            ChargeRate::Fixed(rate) => rate,
            ChargeRate::Speed => 1,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            charge_threshold: Self::DEFAULT_CHARGE_THRESHOLD,
            charge_rate: ChargeRate::Speed,
            cast_rate: Self::DEFAULT_CAST_RATE,
            turn_length: 0,
            reset_on_turn_end: true,
            reset_on_interrupt: true,
            interrupt_on_damage: false,
            announce_instant_casts: false,
            seed: 0,
        }
    }
}
