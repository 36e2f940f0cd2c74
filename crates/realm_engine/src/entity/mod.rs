//! Entity kernel
//!
//! Players and monsters share one capability contract, [`Combatant`]. The
//! combat and lifecycle rules live in [`kernel`] as free functions over that
//! contract; each variant only supplies its data and its update hook.

pub mod combat;
pub mod kernel;
pub mod player;
pub mod monster;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeModel, Equipment, StatRecord};
use crate::core::config::EngineConfig;

pub use combat::{DamageResult, DamageType, Hit};
pub use kernel::Transition;
pub use monster::Monster;
pub use player::Player;

/// Stable numeric identity of a player account
pub type UserId = u64;

slotmap::new_key_type! {
    /// Key of a monster within its location
    pub struct MonsterKey;
}

/// Non-owning reference to an entity, resolved through the world when used
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// An active player
    Player(UserId),
    /// A monster living in a location
    Monster {
        /// Owning location id
        location: String,
        /// Key within that location
        key: MonsterKey,
    },
}

impl EntityRef {
    /// Player id, if this refers to a player
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Player(id) => Some(*id),
            Self::Monster { .. } => None,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => write!(f, "player#{id}"),
            Self::Monster { location, key } => write!(f, "monster{key:?}@{location}"),
        }
    }
}

/// Current values of an entity's depletable resources
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current life
    pub life: f32,
    /// Current mentality
    pub mentality: f32,
    /// Current hunger, `0..=MAX_NEED`
    pub hunger: f32,
    /// Current thirst, `0..=MAX_NEED`
    pub thirst: f32,
}

impl Vitals {
    /// Upper bound of hunger and thirst
    pub const MAX_NEED: f32 = 100.0;

    /// Full vitals for the given caps
    pub const fn full(max_life: f32, max_mentality: f32) -> Self {
        Self {
            life: max_life,
            mentality: max_mentality,
            hunger: Self::MAX_NEED,
            thirst: Self::MAX_NEED,
        }
    }
}

/// Combat and lifecycle bookkeeping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatState {
    /// Entity this one is fighting
    pub current_target: Option<EntityRef>,
    /// Last entity that damaged this one
    pub last_damage_cause: Option<EntityRef>,
    /// Dead flag
    pub dead: bool,
    /// Seconds left until respawn
    pub death_timer: f32,
    /// Seconds left until the next attack is allowed
    pub cooldown: f32,
    /// Length of the last cooldown
    pub max_cooldown: f32,
}

/// Request emitted by an entity's update hook, carried out by the world
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Attack the given entity
    Attack {
        /// Target
        target: EntityRef,
        /// Damage type
        kind: DamageType,
    },
    /// Pick a target among players sharing the location
    SeekTarget,
}

/// Capability contract shared by players and monsters
pub trait Combatant {
    /// Reference other entities can hold to this one
    fn entity_ref(&self) -> EntityRef;

    /// Display name
    fn name(&self) -> &str;

    /// Current level
    fn level(&self) -> u32;

    /// Id of the location the entity is in
    fn location(&self) -> &str;

    /// Attribute model
    fn attributes(&self) -> &AttributeModel;

    /// Mutable attribute model
    fn attributes_mut(&mut self) -> &mut AttributeModel;

    /// Equipment table
    fn equipment(&self) -> &Equipment;

    /// Allocated stat points
    fn stats(&self) -> &StatRecord;

    /// Current vitals
    fn vitals(&self) -> &Vitals;

    /// Mutable vitals
    fn vitals_mut(&mut self) -> &mut Vitals;

    /// Combat bookkeeping
    fn combat(&self) -> &CombatState;

    /// Mutable combat bookkeeping
    fn combat_mut(&mut self) -> &mut CombatState;

    /// Seconds this variant stays dead
    fn death_duration(&self, config: &EngineConfig) -> f32;

    /// Variant-specific update phase hook
    fn update(&mut self, dt: f32, config: &EngineConfig) -> Option<Intent>;

    /// Whether the entity is between locations
    fn is_moving(&self) -> bool {
        false
    }

    /// Dead flag
    fn is_dead(&self) -> bool {
        self.combat().dead
    }

    /// Current life
    fn life(&self) -> f32 {
        self.vitals().life
    }

    /// Life cap
    fn max_life(&self) -> f32 {
        self.attributes().get(Attribute::MaxLife)
    }

    /// Current mentality
    fn mentality(&self) -> f32 {
        self.vitals().mentality
    }

    /// Entity currently being fought
    fn current_target(&self) -> Option<&EntityRef> {
        self.combat().current_target.as_ref()
    }

    /// Take a hit, see [`kernel::damage`]
    fn damage(&mut self, hit: Hit) -> DamageResult {
        kernel::damage(self, hit)
    }

    /// Early phase, see [`kernel::early_update`]
    fn early_update(&mut self, dt: f32, config: &EngineConfig) -> Option<Transition> {
        kernel::early_update(self, dt, config)
    }

    /// Late phase, see [`kernel::late_update`]
    fn late_update(&mut self, config: &EngineConfig) -> Option<Transition> {
        kernel::late_update(self, config)
    }
}
