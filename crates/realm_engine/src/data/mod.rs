//! Static data registry
//!
//! Location, monster and item definitions are loaded once at startup,
//! validated, and never mutated afterwards. Everything else refers to them
//! by id.

pub mod defs;

use std::collections::{HashMap, HashSet};
use std::path::Path;

pub use defs::{ConnectionDef, DropEntry, ItemDef, LocationDef, MonsterDef, SpawnDef, UseEffect, WorldData};

/// Static data defects, all fatal at startup
#[derive(thiserror::Error, Debug)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// The same id is defined twice
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Definition kind
        kind: &'static str,
        /// Offending id
        id: String,
    },

    /// Reference to a monster that does not exist
    #[error("{context} references unknown monster '{monster}'")]
    UnknownMonster {
        /// Where the reference was found
        context: String,
        /// Missing id
        monster: String,
    },

    /// Reference to an item that does not exist
    #[error("{context} references unknown item '{item}'")]
    UnknownItem {
        /// Where the reference was found
        context: String,
        /// Missing id
        item: String,
    },

    /// Reference to a location that does not exist
    #[error("{context} references unknown location '{location}'")]
    UnknownLocation {
        /// Where the reference was found
        context: String,
        /// Missing id
        location: String,
    },

    /// A spawn timer that can never work
    #[error("invalid spawn of '{monster}' in '{location}': {reason}")]
    InvalidSpawn {
        /// Location id
        location: String,
        /// Monster id
        monster: String,
        /// What is wrong
        reason: &'static str,
    },

    /// The data defines no locations
    #[error("world data has no locations")]
    NoLocations,
}

/// Validated, immutable definitions
#[derive(Debug, Clone)]
pub struct StaticData {
    locations: HashMap<String, LocationDef>,
    location_order: Vec<String>,
    monsters: HashMap<String, MonsterDef>,
    items: HashMap<String, ItemDef>,
}

impl StaticData {
    /// Load and validate a RON world data file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let data = Self::parse(&contents)?;
        log::info!(
            "Loaded static data from {}: {} locations, {} monsters, {} items",
            path.display(),
            data.locations.len(),
            data.monsters.len(),
            data.items.len()
        );
        Ok(data)
    }

    /// Parse and validate a RON world data document
    pub fn parse(contents: &str) -> Result<Self, DataError> {
        let data: WorldData = ron::from_str(contents).map_err(|e| DataError::Parse(e.to_string()))?;
        Self::from_world_data(data)
    }

    /// Validate a world data document
    pub fn from_world_data(data: WorldData) -> Result<Self, DataError> {
        if data.locations.is_empty() {
            return Err(DataError::NoLocations);
        }

        let items = index_by_id("item", data.items, |d| &d.id)?;
        let monsters = index_by_id("monster", data.monsters, |d| &d.id)?;
        let location_order: Vec<String> = data.locations.iter().map(|d| d.id.clone()).collect();
        let locations = index_by_id("location", data.locations, |d| &d.id)?;

        for monster in monsters.values() {
            for drop in &monster.drops {
                if !items.contains_key(&drop.item) {
                    return Err(DataError::UnknownItem {
                        context: format!("drop table of '{}'", monster.id),
                        item: drop.item.clone(),
                    });
                }
            }
        }

        for location in locations.values() {
            for spawn in &location.spawns {
                if !monsters.contains_key(&spawn.monster) {
                    return Err(DataError::UnknownMonster {
                        context: format!("spawn in '{}'", location.id),
                        monster: spawn.monster.clone(),
                    });
                }
                let invalid = |reason| DataError::InvalidSpawn {
                    location: location.id.clone(),
                    monster: spawn.monster.clone(),
                    reason,
                };
                if spawn.max == 0 {
                    return Err(invalid("max must be at least 1"));
                }
                if spawn.respawn_time <= 0.0 {
                    return Err(invalid("respawn time must be positive"));
                }
            }
            for connection in &location.connections {
                if !locations.contains_key(&connection.to) {
                    return Err(DataError::UnknownLocation {
                        context: format!("connection from '{}'", location.id),
                        location: connection.to.clone(),
                    });
                }
            }
        }

        Ok(Self { locations, location_order, monsters, items })
    }

    /// Location definition
    pub fn location(&self, id: &str) -> Option<&LocationDef> {
        self.locations.get(id)
    }

    /// Location definitions in file order
    pub fn locations(&self) -> impl Iterator<Item = &LocationDef> {
        self.location_order.iter().filter_map(|id| self.locations.get(id))
    }

    /// First location in the data file
    pub fn first_location(&self) -> &str {
        // Construction rejects empty location lists
        &self.location_order[0]
    }

    /// Monster definition
    pub fn monster(&self, id: &str) -> Option<&MonsterDef> {
        self.monsters.get(id)
    }

    /// Item definition
    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }
}

fn index_by_id<T>(
    kind: &'static str,
    defs: Vec<T>,
    id: impl Fn(&T) -> &String,
) -> Result<HashMap<String, T>, DataError> {
    let mut seen = HashSet::new();
    let mut map = HashMap::with_capacity(defs.len());
    for def in defs {
        let key = id(&def).clone();
        if !seen.insert(key.clone()) {
            return Err(DataError::DuplicateId { kind, id: key });
        }
        map.insert(key, def);
    }
    Ok(map)
}
