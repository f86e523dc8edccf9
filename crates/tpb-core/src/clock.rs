//! Battler readiness clock.
//!
//! The clock is pure integer arithmetic over a battler's counters:
//! - while `Charging`, the charge counter grows by the configured rate until it
//!   reaches the threshold, at which point the battler is ready
//! - while `Casting`, the cast counter grows by the cast rate until it reaches
//!   the delay of the action being cast
//!
//! Charge is capped at the threshold so a battler that waits for input does not
//! keep accumulating an unbounded surplus.
//!
//! # Example
//!
//! ```
//! use tpb_core::battler::{Battler, BattlerId, ResourcePools, Side};
//! use tpb_core::clock::ReadinessClock;
//! use tpb_core::config::{ChargeRate, SchedulerConfig};
//!
//! let config = SchedulerConfig { charge_rate: ChargeRate::Fixed(25), ..SchedulerConfig::default() };
//! let clock = ReadinessClock::new(&config);
//! let mut battler = Battler::new(BattlerId::new(0), Side::Ally, 0, 1, ResourcePools::default());
//!
//! for _ in 0..3 {
//!     assert!(!clock.tick(&mut battler));
//! }
//! assert!(clock.tick(&mut battler));
//! assert!(clock.is_ready(&battler));
//! ```

use crate::battler::{Battler, TpbState};
use crate::config::{ChargeRate, SchedulerConfig};

/// Per-battler readiness accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessClock {
    threshold: u32,
    rate: ChargeRate,
    cast_rate: u32,
}

impl ReadinessClock {
    /// Creates a clock from the scheduler configuration.
    #[must_use]
    pub const fn new(config: &SchedulerConfig) -> Self {
        Self {
            threshold: config.charge_threshold,
            rate: config.charge_rate,
            cast_rate: config.cast_rate,
        }
    }

    /// Returns the charge needed to become ready.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns the charge a battler gains per tick.
    #[must_use]
    pub fn rate_for(&self, battler: &Battler) -> u32 {
        match self.rate {
            ChargeRate::Fixed(rate) => rate.max(1),
            ChargeRate::Speed => battler.speed().max(1),
        }
    }

    /// Advances the charge of a `Charging` battler by one tick.
    ///
    /// Returns true if the battler is ready afterwards. Battlers in any other
    /// state are left untouched.
    pub fn tick(&self, battler: &mut Battler) -> bool {
        if battler.state != TpbState::Charging {
            return false;
        }
        let rate = self.rate_for(battler);
        battler.charge_time = battler.charge_time.saturating_add(rate).min(self.threshold);
        self.is_ready(battler)
    }

    /// Returns true once the charge has reached the threshold.
    #[must_use]
    pub fn is_ready(&self, battler: &Battler) -> bool {
        battler.charge_time >= self.threshold
    }

    /// Advances the cast progress of a `Casting` battler by one tick.
    ///
    /// Returns true if the cast is complete afterwards.
    pub fn tick_cast(&self, battler: &mut Battler) -> bool {
        if battler.state != TpbState::Casting {
            return false;
        }
        battler.cast_time = battler
            .cast_time
            .saturating_add(self.cast_rate)
            .min(battler.required_cast_time);
        self.is_cast_complete(battler)
    }

    /// Returns true once the cast progress has reached the required delay.
    #[must_use]
    pub fn is_cast_complete(&self, battler: &Battler) -> bool {
        battler.cast_time >= battler.required_cast_time
    }

    /// Zeroes all counters.
    pub fn reset(&self, battler: &mut Battler) {
        battler.clear_counters(true);
    }

    /// Returns the number of ticks left in the battler's current state.
    ///
    /// `Acting` and `Done` always report zero.
    #[must_use]
    pub fn remaining_ticks(&self, battler: &Battler) -> u32 {
        match battler.state {
            TpbState::Charging => self
                .threshold
                .saturating_sub(battler.charge_time)
                .div_ceil(self.rate_for(battler)),
            TpbState::Casting => battler
                .required_cast_time
                .saturating_sub(battler.cast_time)
                .div_ceil(self.cast_rate.max(1)),
            TpbState::Acting | TpbState::Done => 0,
        }
    }

    /// Returns the completed fraction of the current cast, for cast bars.
    #[must_use]
    pub fn cast_progress(&self, battler: &Battler) -> Option<f32> {
        if battler.state != TpbState::Casting {
            return None;
        }
        if battler.required_cast_time == 0 {
            return Some(1.0);
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = battler.cast_time as f32 / battler.required_cast_time as f32;
        Some(ratio.min(1.0))
    }
}
