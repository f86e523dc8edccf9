//! Read-only collaborator data consumed by the scheduler.
//!
//! The scheduler never owns game data. It looks it up by numeric id through two
//! traits:
//!
//! - [`BattlerData`]: static battler attributes ([`BattlerProfile`])
//! - [`ActionCatalog`]: cast delay, costs and effect callback of a skill or item
//!   ([`ActionDefinition`])
//!
//! Collaborator numbers are signed on purpose: data tables are hand-edited and a
//! malformed formula can produce a negative delay or cost. Such values are
//! logged and treated as zero so a battler's turn can never stall on bad data.
//!
//! [`MemoryCatalog`] is a plain in-memory table implementing both traits.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::action::UsableRef;
use crate::battler::ItemId;
use crate::effect::ActionEffect;

// =============================================================================
// Battler data
// =============================================================================

/// Identifier of a battler profile in the battler data table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub u32);

/// Static attributes of a battler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlerProfile {
    /// Display name.
    pub name: String,
    /// Charge gained per tick under speed-scaled charging.
    pub speed: u32,
    /// Maximum HP.
    pub max_hp: u32,
    /// Maximum MP.
    pub max_mp: u32,
    /// Maximum TP.
    pub max_tp: u32,
}

/// Read-only lookup of battler profiles.
pub trait BattlerData: Send + Sync {
    /// Returns the profile with the given id, if present.
    fn profile(&self, id: ProfileId) -> Option<BattlerProfile>;
}

// =============================================================================
// Action definitions
// =============================================================================

/// Sanitized cost of an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    /// MP deducted.
    pub mp: u32,
    /// TP deducted.
    pub tp: u32,
    /// Item consumed from the actor's side inventory.
    pub item: Option<ItemId>,
}

impl Cost {
    /// Returns true if nothing is deducted.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.mp == 0 && self.tp == 0 && self.item.is_none()
    }
}

/// Scheduling data and effect of a skill or item.
#[derive(Clone)]
pub struct ActionDefinition {
    /// Cast delay in cast-progress units, as produced by the delay formula.
    pub cast_delay: i32,
    /// MP cost as produced by the cost formula.
    pub mp_cost: i32,
    /// TP cost as produced by the cost formula.
    pub tp_cost: i32,
    /// Whether using the item consumes one unit of it.
    pub consumable: bool,
    /// Effect callback invoked when the action resolves.
    pub effect: Arc<dyn ActionEffect>,
}

impl fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("cast_delay", &self.cast_delay)
            .field("mp_cost", &self.mp_cost)
            .field("tp_cost", &self.tp_cost)
            .field("consumable", &self.consumable)
            .finish_non_exhaustive()
    }
}

impl ActionDefinition {
    /// Creates a free, zero-delay definition with the given effect.
    #[must_use]
    pub fn instant(effect: Arc<dyn ActionEffect>) -> Self {
        Self {
            cast_delay: 0,
            mp_cost: 0,
            tp_cost: 0,
            consumable: false,
            effect,
        }
    }

    /// Sets the cast delay.
    #[must_use]
    pub fn with_cast_delay(mut self, delay: i32) -> Self {
        self.cast_delay = delay;
        self
    }

    /// Sets the MP cost.
    #[must_use]
    pub fn with_mp_cost(mut self, mp: i32) -> Self {
        self.mp_cost = mp;
        self
    }

    /// Sets the TP cost.
    #[must_use]
    pub fn with_tp_cost(mut self, tp: i32) -> Self {
        self.tp_cost = tp;
        self
    }

    /// Marks the item as consumed on use.
    #[must_use]
    pub fn consumable(mut self) -> Self {
        self.consumable = true;
        self
    }

    /// Returns the cast delay, with negative values treated as zero.
    #[must_use]
    pub fn delay_for(&self, usable: UsableRef) -> u32 {
        sanitize(self.cast_delay, usable, "cast delay")
    }

    /// Returns the cost of using `usable`, with negative amounts treated as zero.
    #[must_use]
    pub fn cost_for(&self, usable: UsableRef) -> Cost {
        Cost {
            mp: sanitize(self.mp_cost, usable, "mp cost"),
            tp: sanitize(self.tp_cost, usable, "tp cost"),
            item: match usable {
                UsableRef::Item(item) if self.consumable => Some(item),
                _ => None,
            },
        }
    }
}

fn sanitize(value: i32, usable: UsableRef, field: &'static str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        warn!(%usable, field, value, "negative value in action data, treating as zero");
        0
    })
}

/// Read-only lookup of action definitions.
pub trait ActionCatalog: Send + Sync {
    /// Returns the definition of a skill or item, if present.
    fn definition(&self, usable: UsableRef) -> Option<ActionDefinition>;
}

// =============================================================================
// In-memory tables
// =============================================================================

/// In-memory battler and action tables.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tpb_core::action::UsableRef;
/// use tpb_core::catalog::{ActionCatalog, ActionDefinition, BattlerProfile, MemoryCatalog, ProfileId};
/// use tpb_core::effect::NoEffect;
///
/// let mut catalog = MemoryCatalog::new();
/// catalog.insert_action(
///     UsableRef::Skill(1),
///     ActionDefinition::instant(Arc::new(NoEffect)).with_cast_delay(-3),
/// );
///
/// let definition = catalog.definition(UsableRef::Skill(1)).unwrap();
/// assert_eq!(definition.delay_for(UsableRef::Skill(1)), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    profiles: BTreeMap<ProfileId, BattlerProfile>,
    actions: HashMap<UsableRef, ActionDefinition>,
}

impl MemoryCatalog {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a battler profile.
    pub fn insert_profile(&mut self, id: ProfileId, profile: BattlerProfile) {
        self.profiles.insert(id, profile);
    }

    /// Inserts or replaces an action definition.
    pub fn insert_action(&mut self, usable: UsableRef, definition: ActionDefinition) {
        self.actions.insert(usable, definition);
    }
}

impl BattlerData for MemoryCatalog {
    fn profile(&self, id: ProfileId) -> Option<BattlerProfile> {
        self.profiles.get(&id).cloned()
    }
}

impl ActionCatalog for MemoryCatalog {
    fn definition(&self, usable: UsableRef) -> Option<ActionDefinition> {
        self.actions.get(&usable).cloned()
    }
}
