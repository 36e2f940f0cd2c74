//! Locations: spawn timers, dropped items and the connection graph
//!
//! A location owns its monsters. They are keyed by [`MonsterKey`] and never
//! removed on death; a dead monster respawns in place through the entity
//! lifecycle.

pub mod conditions;
pub mod travel;

use log::{debug, warn};
use slotmap::SlotMap;

use crate::attributes::ItemInstance;
use crate::data::{ConnectionDef, LocationDef, StaticData};
use crate::entity::{Combatant, Monster, MonsterKey};
use crate::foundation::math::{point_from, Point3};

pub use conditions::{Access, ConditionRegistry};
pub use travel::{travel_duration, Travel, TravelError};

/// Countdown controlling how one monster definition repopulates a location
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnTimer {
    /// Monster definition id
    pub monster: String,
    /// Cap on instances of the monster in this location
    pub max: u32,
    /// Seconds between spawns
    pub respawn_time: f32,
    /// Seconds until the next spawn
    pub remaining: f32,
}

/// A connection as seen by one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableConnection {
    /// Destination location id
    pub to: String,
    /// Listed but not usable
    pub locked: bool,
}

/// A live location
#[derive(Debug, Clone)]
pub struct Location {
    id: String,
    name: String,
    position: Point3,
    monsters: SlotMap<MonsterKey, Monster>,
    items: Vec<ItemInstance>,
    spawn_timers: Vec<SpawnTimer>,
    connections: Vec<ConnectionDef>,
}

impl Location {
    /// Build an empty location from its definition
    ///
    /// Spawn timers start at zero, so each one spawns on the first update.
    pub fn from_def(def: &LocationDef) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            position: point_from(def.position),
            monsters: SlotMap::with_key(),
            items: Vec::new(),
            spawn_timers: def
                .spawns
                .iter()
                .map(|spawn| SpawnTimer {
                    monster: spawn.monster.clone(),
                    max: spawn.max,
                    respawn_time: spawn.respawn_time,
                    remaining: 0.0,
                })
                .collect(),
            connections: def.connections.clone(),
        }
    }

    /// Location id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placement
    pub const fn position(&self) -> &Point3 {
        &self.position
    }

    /// Static connections
    pub fn connections(&self) -> &[ConnectionDef] {
        &self.connections
    }

    /// Whether a connection leads to `to`
    pub fn connection_to(&self, to: &str) -> Option<&ConnectionDef> {
        self.connections.iter().find(|c| c.to == to)
    }

    /// Spawn timers
    pub fn spawn_timers(&self) -> &[SpawnTimer] {
        &self.spawn_timers
    }

    /// Monster by key
    pub fn monster(&self, key: MonsterKey) -> Option<&Monster> {
        self.monsters.get(key)
    }

    /// Mutable monster by key
    pub fn monster_mut(&mut self, key: MonsterKey) -> Option<&mut Monster> {
        self.monsters.get_mut(key)
    }

    /// Two distinct monsters at once
    pub fn monster_pair_mut(&mut self, a: MonsterKey, b: MonsterKey) -> Option<[&mut Monster; 2]> {
        self.monsters.get_disjoint_mut([a, b])
    }

    /// Every monster, dead or alive
    pub fn monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    /// Every monster, mutable
    pub fn monsters_mut(&mut self) -> impl Iterator<Item = &mut Monster> {
        self.monsters.values_mut()
    }

    /// Keys of every monster
    pub fn monster_keys(&self) -> Vec<MonsterKey> {
        self.monsters.keys().collect()
    }

    /// Instances of one definition, counting dead ones waiting to respawn
    pub fn count_of(&self, monster: &str) -> usize {
        self.monsters.values().filter(|m| m.def_id() == monster).count()
    }

    /// Instantiate a monster definition here
    ///
    /// Returns `None` if the definition does not exist.
    pub fn spawn(&mut self, monster: &str, data: &StaticData) -> Option<MonsterKey> {
        let def = data.monster(monster)?;
        let id = self.id.clone();
        let key = self.monsters.insert_with_key(|key| Monster::from_def(key, def, id));
        debug!("Spawned {} in {}", def.name, self.id);
        Some(key)
    }

    /// Items lying on the ground
    pub fn items(&self) -> &[ItemInstance] {
        &self.items
    }

    /// Drop an item on the ground
    pub fn drop_item(&mut self, item: ItemInstance) {
        self.items.push(item);
    }

    /// Pick up the first item with the given definition id
    pub fn take_item(&mut self, item_id: &str) -> Option<ItemInstance> {
        let pos = self.items.iter().position(|i| i.item_id == item_id)?;
        Some(self.items.remove(pos))
    }

    /// Connections `entity` can see, locked ones flagged
    pub fn available_connections(
        &self,
        entity: &dyn Combatant,
        conditions: &ConditionRegistry,
    ) -> Vec<AvailableConnection> {
        self.connections
            .iter()
            .filter_map(|connection| {
                let access = connection
                    .condition
                    .as_deref()
                    .map_or(Access::Visible, |name| conditions.evaluate(name, entity));
                match access {
                    Access::Visible => Some(AvailableConnection { to: connection.to.clone(), locked: false }),
                    Access::Locked => Some(AvailableConnection { to: connection.to.clone(), locked: true }),
                    Access::Hidden => None,
                }
            })
            .collect()
    }

    /// Run the spawn timers
    ///
    /// A timer whose monster is at its cap is held at the full respawn time.
    /// Otherwise it counts down and spawns one monster when it reaches zero.
    /// Returns the keys of the monsters spawned.
    pub fn update(&mut self, dt: f32, data: &StaticData) -> Vec<MonsterKey> {
        let mut spawned = Vec::new();
        for i in 0..self.spawn_timers.len() {
            let count = self.count_of(&self.spawn_timers[i].monster);
            let timer = &mut self.spawn_timers[i];

            if count >= timer.max as usize {
                timer.remaining = timer.respawn_time;
                continue;
            }

            timer.remaining -= dt;
            if timer.remaining > 0.0 {
                continue;
            }
            timer.remaining = timer.respawn_time;

            let monster = timer.monster.clone();
            match self.spawn(&monster, data) {
                Some(key) => spawned.push(key),
                None => warn!("Spawn timer in {} names unknown monster '{}'", self.id, monster),
            }
        }
        spawned
    }
}
