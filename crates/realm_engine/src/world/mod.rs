//! The world: every piece of mutable simulation state plus the tick
//!
//! [`WorldState`] holds the configuration, static data, locations, active
//! players, event bus and RNG. [`World`] pairs it with the coroutine scheduler
//! so coroutines can be resumed with the state as their context.
//!
//! One tick runs, strictly in order: the early phase for every active entity,
//! the update phase for every active entity, the late phase for every active
//! entity, location updates, one scheduler tick, then event dispatch.

pub mod clock;
pub mod item_use;
mod combat;
mod session;

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::attributes::{EquipError, ItemInstance, SlotType, StatType};
use crate::core::config::EngineConfig;
use crate::coroutine::{Coroutine, CoroutineId, Scheduler};
use crate::data::{DataError, StaticData};
use crate::entity::player::StatError;
use crate::entity::{Combatant, Player, Transition, UserId};
use crate::events::{EventBus, EventHandler, EventKind, SimEvent};
use crate::location::{travel_duration, AvailableConnection, ConditionRegistry, Location, Travel, TravelError};
use crate::services::messaging::{Messenger, NotificationHandler};
use crate::services::persistence::PlayerRecord;

pub use combat::AttackError;
pub use item_use::{ItemUse, ItemUseError};
pub use session::SessionError;

/// Rejected player commands
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The player is not logged in
    #[error("player {0} is not active")]
    NotActive(UserId),

    /// Stat allocation failed
    #[error(transparent)]
    Stat(#[from] StatError),

    /// Equipment change failed
    #[error(transparent)]
    Equip(#[from] EquipError),

    /// Nothing with that id lies here
    #[error("there is no '{0}' here")]
    NoSuchItem(String),
}

/// Mutable simulation state
pub struct WorldState {
    pub(crate) config: EngineConfig,
    pub(crate) data: Arc<StaticData>,
    pub(crate) locations: BTreeMap<String, Location>,
    pub(crate) players: BTreeMap<UserId, Player>,
    pub(crate) events: EventBus,
    pub(crate) rng: StdRng,
    pub(crate) conditions: ConditionRegistry,
    pub(crate) save_queue: Vec<PlayerRecord>,
    pub(crate) unsaved: BTreeMap<UserId, PlayerRecord>,
    pub(crate) elapsed: f64,
    pub(crate) next_buff: u64,
}

impl WorldState {
    /// Engine configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Static data registry
    pub fn data(&self) -> &StaticData {
        &self.data
    }

    /// Location by id
    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.get(id)
    }

    /// Mutable location by id
    pub fn location_mut(&mut self, id: &str) -> Option<&mut Location> {
        self.locations.get_mut(id)
    }

    /// Every location, ordered by id
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    /// Active player
    pub fn player(&self, user: UserId) -> Option<&Player> {
        self.players.get(&user)
    }

    /// Mutable active player
    pub fn player_mut(&mut self, user: UserId) -> Option<&mut Player> {
        self.players.get_mut(&user)
    }

    /// Every active player, ordered by id
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Queue an event for the next dispatch
    pub fn send_event(&mut self, event: SimEvent) {
        self.events.send(event);
    }

    /// Events queued since the last dispatch
    pub fn pending_events(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.pending().iter().map(|e| &e.payload)
    }

    /// Simulated seconds since the world was built
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Phase 1: cooldowns, regeneration and death countdowns
    fn early_phase(&mut self, dt: f32) {
        for player in self.players.values_mut() {
            if player.early_update(dt, &self.config) == Some(Transition::Respawned) {
                if let Some(respawn) = &self.config.player_respawn_location {
                    player.relocate(respawn.clone());
                }
                debug!("{} respawned in {}", player.name(), player.location());
                self.events.send(SimEvent::Respawned {
                    entity: player.entity_ref(),
                    name: player.name().to_string(),
                    location: player.location().to_string(),
                });
            }
        }

        for location in self.locations.values_mut() {
            for monster in location.monsters_mut() {
                if monster.early_update(dt, &self.config) == Some(Transition::Respawned) {
                    debug!("{} respawned in {}", monster.name(), monster.location());
                    self.events.send(SimEvent::Respawned {
                        entity: monster.entity_ref(),
                        name: monster.name().to_string(),
                        location: monster.location().to_string(),
                    });
                }
            }
        }
    }

    /// Phase 2: variant hooks, then the intents they raised
    fn update_phase(&mut self, dt: f32) {
        let mut intents = Vec::new();
        for player in self.players.values_mut() {
            if let Some(intent) = player.update(dt, &self.config) {
                intents.push((player.entity_ref(), intent));
            }
        }
        for location in self.locations.values_mut() {
            for monster in location.monsters_mut() {
                if let Some(intent) = monster.update(dt, &self.config) {
                    intents.push((monster.entity_ref(), intent));
                }
            }
        }

        for (actor, intent) in intents {
            self.resolve_intent(&actor, intent);
        }
    }

    /// Phase 3: the `Alive -> Dead` transition
    fn late_phase(&mut self) {
        for player in self.players.values_mut() {
            if player.late_update(&self.config) == Some(Transition::Died) {
                debug!("{} died", player.name());
                self.events.send(SimEvent::Died {
                    entity: player.entity_ref(),
                    name: player.name().to_string(),
                    killer: player.combat().last_damage_cause.clone(),
                });
            }
        }

        let mut fallen = Vec::new();
        for location in self.locations.values_mut() {
            for monster in location.monsters_mut() {
                if monster.late_update(&self.config) == Some(Transition::Died) {
                    debug!("{} died in {}", monster.name(), monster.location());
                    let killer = monster.combat().last_damage_cause.clone();
                    self.events.send(SimEvent::Died {
                        entity: monster.entity_ref(),
                        name: monster.name().to_string(),
                        killer: killer.clone(),
                    });
                    fallen.push((monster.location().to_string(), monster.key(), killer));
                }
            }
        }

        for (location, key, killer) in fallen {
            self.reward_kill(&location, key, killer.as_ref());
        }
    }

    /// Spawn timers of every location
    fn update_locations(&mut self, dt: f32) {
        for location in self.locations.values_mut() {
            for key in location.update(dt, &self.data) {
                if let Some(monster) = location.monster(key) {
                    self.events.send(SimEvent::MonsterSpawned {
                        location: location.id().to_string(),
                        key,
                        monster: monster.def_id().to_string(),
                    });
                }
            }
        }
    }
}

/// The simulation world
pub struct World {
    state: WorldState,
    scheduler: Scheduler<WorldState>,
    messenger: Option<Rc<dyn Messenger>>,
}

impl World {
    /// Build every location from static data
    ///
    /// Fails if the configured start or respawn location is not in the data.
    pub fn new(config: EngineConfig, data: Arc<StaticData>) -> Result<Self, DataError> {
        for (context, id) in [
            ("start_location", &config.start_location),
            ("player_respawn_location", &config.player_respawn_location),
        ] {
            if let Some(id) = id {
                if data.location(id).is_none() {
                    return Err(DataError::UnknownLocation {
                        context: format!("engine config {context}"),
                        location: id.clone(),
                    });
                }
            }
        }

        let locations: BTreeMap<String, Location> = data
            .locations()
            .map(|def| (def.id.clone(), Location::from_def(def)))
            .collect();
        info!("World built with {} locations", locations.len());

        let rng = StdRng::seed_from_u64(config.rng_seed);
        Ok(Self {
            state: WorldState {
                config,
                data,
                locations,
                players: BTreeMap::new(),
                events: EventBus::new(),
                rng,
                conditions: ConditionRegistry::new(),
                save_queue: Vec::new(),
                unsaved: BTreeMap::new(),
                elapsed: 0.0,
                next_buff: 0,
            },
            scheduler: Scheduler::new(),
            messenger: None,
        })
    }

    /// Route notifications through `messenger`
    #[must_use]
    pub fn with_messenger(mut self, messenger: Rc<dyn Messenger>) -> Self {
        for kind in EventKind::ALL {
            self.state
                .events
                .register_handler(kind, Box::new(NotificationHandler::new(messenger.clone())));
        }
        self.messenger = Some(messenger);
        self
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        let state = &mut self.state;
        state.elapsed += f64::from(dt);
        state.events.update_time(state.elapsed);

        state.early_phase(dt);
        state.update_phase(dt);
        state.late_phase();
        state.update_locations(dt);
        self.scheduler.tick(dt, &mut self.state);

        self.state.events.dispatch();
    }

    /// Simulation state
    pub const fn state(&self) -> &WorldState {
        &self.state
    }

    /// Mutable simulation state
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// Engine configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    /// Active player
    pub fn player(&self, user: UserId) -> Option<&Player> {
        self.state.player(user)
    }

    /// Mutable active player
    pub fn player_mut(&mut self, user: UserId) -> Option<&mut Player> {
        self.state.player_mut(user)
    }

    /// Location by id
    pub fn location(&self, id: &str) -> Option<&Location> {
        self.state.location(id)
    }

    /// Mutable location by id
    pub fn location_mut(&mut self, id: &str) -> Option<&mut Location> {
        self.state.location_mut(id)
    }

    /// Condition registry for connection gates
    pub fn conditions_mut(&mut self) -> &mut ConditionRegistry {
        &mut self.state.conditions
    }

    /// Register an event handler
    pub fn register_handler(&mut self, kind: EventKind, handler: Box<dyn EventHandler>) {
        self.state.events.register_handler(kind, handler);
    }

    /// Start a coroutine against this world
    pub fn start_coroutine(&mut self, body: Box<dyn Coroutine<WorldState>>) -> Option<CoroutineId> {
        self.scheduler.start(body, &mut self.state)
    }

    /// Number of running coroutines
    pub fn coroutine_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Send `message` to every active player matching `predicate`
    pub fn broadcast(&self, predicate: impl Fn(&Player) -> bool, message: &str) {
        let Some(messenger) = &self.messenger else {
            return;
        };
        let users: Vec<UserId> = self
            .state
            .players
            .values()
            .filter(|p| predicate(p))
            .map(Player::user_id)
            .collect();
        messenger.broadcast(&users, message);
    }

    /// Connections the player can see from their current location
    pub fn available_connections(&self, user: UserId) -> Option<Vec<AvailableConnection>> {
        let player = self.state.players.get(&user)?;
        let location = self.state.locations.get(player.location())?;
        Some(location.available_connections(player, &self.state.conditions))
    }

    /// Start travelling to a connected location
    ///
    /// Returns the travel time in seconds.
    pub fn travel(&mut self, user: UserId, to: &str) -> Result<f32, TravelError> {
        let state = &mut self.state;
        let player = state.players.get(&user).ok_or(TravelError::NotActive(user))?;
        if player.is_dead() {
            return Err(TravelError::Dead);
        }
        if player.is_moving() {
            return Err(TravelError::AlreadyMoving);
        }
        let destination = state
            .locations
            .get(to)
            .ok_or_else(|| TravelError::UnknownLocation(to.to_string()))?;
        let origin = state
            .locations
            .get(player.location())
            .ok_or_else(|| TravelError::UnknownLocation(player.location().to_string()))?;

        let connection = origin
            .available_connections(player, &state.conditions)
            .into_iter()
            .find(|c| c.to == to)
            .ok_or_else(|| TravelError::NoConnection {
                from: origin.id().to_string(),
                to: to.to_string(),
            })?;
        if connection.locked {
            return Err(TravelError::Locked(to.to_string()));
        }

        let speed = player.attributes().get(crate::attributes::Attribute::Speed);
        let duration = travel_duration(
            origin.position(),
            destination.position(),
            speed,
            state.config.min_travel_speed,
        );
        let from = origin.id().to_string();
        let interval = state.config.travel_progress_interval;

        if let Some(player) = state.players.get_mut(&user) {
            player.set_moving(true);
            debug!("{} travels from {} to {} ({:.1}s)", player.name(), from, to, duration);
        }
        state.events.send(SimEvent::TravelStarted {
            user,
            from,
            to: to.to_string(),
            duration,
        });
        self.scheduler
            .start(Box::new(Travel::new(user, to, duration, interval)), &mut self.state);
        Ok(duration)
    }

    /// Use an item with a timed effect
    pub fn use_item(&mut self, user: UserId, item_id: &str) -> Result<(), ItemUseError> {
        let state = &mut self.state;
        let player = state.players.get(&user).ok_or(ItemUseError::NotActive(user))?;
        if player.is_dead() {
            return Err(ItemUseError::Dead);
        }
        let def = state
            .data
            .item(item_id)
            .ok_or_else(|| ItemUseError::UnknownItem(item_id.to_string()))?;
        let effect = def
            .use_effect
            .clone()
            .ok_or_else(|| ItemUseError::NotUsable(def.name.clone()))?;

        let sequence = state.next_buff;
        state.next_buff += 1;
        let body = ItemUse::new(user, def, effect, sequence);
        self.scheduler.start(Box::new(body), &mut self.state);
        Ok(())
    }

    /// Spend unspent stat points
    pub fn allocate_stat(&mut self, user: UserId, stat: StatType, points: u32) -> Result<(), CommandError> {
        let player = self.player_mut(user).ok_or(CommandError::NotActive(user))?;
        player.allocate_stat(stat, points)?;
        Ok(())
    }

    /// Equip an item on an active player
    pub fn equip(
        &mut self,
        user: UserId,
        slot: SlotType,
        item: &ItemInstance,
        index: Option<u8>,
    ) -> Result<u8, CommandError> {
        let player = self.player_mut(user).ok_or(CommandError::NotActive(user))?;
        Ok(player.equip(slot, item, index)?)
    }

    /// Unequip an item from an active player, handing it back
    pub fn unequip(&mut self, user: UserId, slot: SlotType, index: u8) -> Result<ItemInstance, CommandError> {
        let player = self.player_mut(user).ok_or(CommandError::NotActive(user))?;
        Ok(player.unequip(slot, index)?)
    }

    /// Take an item from the ground of the player's location
    pub fn pick_up_item(&mut self, user: UserId, item_id: &str) -> Result<ItemInstance, CommandError> {
        let state = &mut self.state;
        let player = state.players.get(&user).ok_or(CommandError::NotActive(user))?;
        state
            .locations
            .get_mut(player.location())
            .and_then(|location| location.take_item(item_id))
            .ok_or_else(|| CommandError::NoSuchItem(item_id.to_string()))
    }
}
