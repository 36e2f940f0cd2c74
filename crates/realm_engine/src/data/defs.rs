//! Static definitions as written in world data files

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeRecord, ItemInstance, ModifierTemplate, SlotType};

/// Item definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Slot the item is worn in, if equippable
    #[serde(default)]
    pub slot: Option<SlotType>,
    /// Modifiers contributed while equipped
    #[serde(default)]
    pub modifiers: Vec<ModifierTemplate>,
    /// Effect applied when the item is used
    #[serde(default)]
    pub use_effect: Option<UseEffect>,
}

impl ItemDef {
    /// Create a concrete item from this definition
    pub fn instantiate(&self) -> ItemInstance {
        ItemInstance {
            item_id: self.id.clone(),
            name: self.name.clone(),
            slot: self.slot,
            modifiers: self.modifiers.clone(),
        }
    }
}

/// Timed effect of using an item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UseEffect {
    /// Seconds between use and the effect landing
    pub delay: f32,
    /// Life restored when the effect lands
    pub heal: f32,
    /// Modifiers applied when the effect lands
    pub buffs: Vec<ModifierTemplate>,
    /// Seconds the buff modifiers stay active
    pub duration: f32,
}

/// One possible drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropEntry {
    /// Item id
    pub item: String,
    /// Probability in `[0, 1]`
    pub chance: f32,
}

fn default_level() -> u32 {
    1
}

fn default_death_time() -> f32 {
    10.0
}

/// Monster definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterDef {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Level shown to players
    #[serde(default = "default_level")]
    pub level: u32,
    /// Fixed base attributes
    pub attributes: AttributeRecord,
    /// Seconds between death and respawn
    #[serde(default = "default_death_time")]
    pub death_time: f32,
    /// Experience granted to the killer
    #[serde(default)]
    pub exp_reward: u64,
    /// Whether the monster attacks players without being provoked
    #[serde(default)]
    pub aggressive: bool,
    /// Drop table rolled on death
    #[serde(default)]
    pub drops: Vec<DropEntry>,
}

/// Spawn timer definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnDef {
    /// Monster id
    pub monster: String,
    /// Cap on instances of this monster in the location
    pub max: u32,
    /// Seconds between spawns
    pub respawn_time: f32,
}

/// Connection to a neighboring location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDef {
    /// Destination location id
    pub to: String,
    /// Named condition gating the connection
    #[serde(default)]
    pub condition: Option<String>,
}

/// Location definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDef {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// `[x, y, z]` placement
    pub position: [f32; 3],
    /// Spawn timers
    #[serde(default)]
    pub spawns: Vec<SpawnDef>,
    /// Outgoing connections
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
}

/// A complete world data document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldData {
    /// Locations, first one is the default start location
    pub locations: Vec<LocationDef>,
    /// Monster definitions
    pub monsters: Vec<MonsterDef>,
    /// Item definitions
    pub items: Vec<ItemDef>,
}
