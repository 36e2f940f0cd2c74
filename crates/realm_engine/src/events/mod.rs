//! Simulation event bus
//!
//! Kernel results and lifecycle transitions are queued as [`SimEvent`]s and
//! dispatched once per tick to the handlers registered for their kind.
//! A handler returns `true` to consume the event and stop forwarding.

use std::collections::HashMap;

use crate::entity::{DamageResult, EntityRef, MonsterKey, UserId};

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An attack landed
    Attacked,
    /// An entity died
    Died,
    /// An entity respawned
    Respawned,
    /// A spawn timer produced a monster
    MonsterSpawned,
    /// A dead monster dropped an item
    LootDropped,
    /// A travel began
    TravelStarted,
    /// A travel is under way
    TravelProgress,
    /// A travel finished
    TravelArrived,
    /// A travel was abandoned
    TravelAborted,
    /// A used item took effect
    ItemApplied,
    /// A timed item buff ran out
    BuffExpired,
    /// A player earned experience
    ExpGained,
    /// A player levelled up
    LevelUp,
}

impl EventKind {
    /// Every kind
    pub const ALL: [Self; 13] = [
        Self::Attacked,
        Self::Died,
        Self::Respawned,
        Self::MonsterSpawned,
        Self::LootDropped,
        Self::TravelStarted,
        Self::TravelProgress,
        Self::TravelArrived,
        Self::TravelAborted,
        Self::ItemApplied,
        Self::BuffExpired,
        Self::ExpGained,
        Self::LevelUp,
    ];
}

/// Something that happened in the simulation
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// `attacker` hit `target`
    Attacked {
        /// Attacker
        attacker: EntityRef,
        /// Attacker display name
        attacker_name: String,
        /// Target
        target: EntityRef,
        /// Target display name
        target_name: String,
        /// Outcome
        result: DamageResult,
    },
    /// `entity` died
    Died {
        /// Dead entity
        entity: EntityRef,
        /// Display name
        name: String,
        /// Last damage cause
        killer: Option<EntityRef>,
    },
    /// `entity` respawned
    Respawned {
        /// Respawned entity
        entity: EntityRef,
        /// Display name
        name: String,
        /// Location it respawned in
        location: String,
    },
    /// A monster spawned
    MonsterSpawned {
        /// Location id
        location: String,
        /// Key within the location
        key: MonsterKey,
        /// Monster definition id
        monster: String,
    },
    /// An item was dropped on the ground
    LootDropped {
        /// Location id
        location: String,
        /// Item definition id
        item: String,
    },
    /// A player set off
    TravelStarted {
        /// Traveler
        user: UserId,
        /// Origin location id
        from: String,
        /// Destination location id
        to: String,
        /// Total travel time in seconds
        duration: f32,
    },
    /// A player is still on the road
    TravelProgress {
        /// Traveler
        user: UserId,
        /// Destination location id
        to: String,
        /// Seconds left
        remaining: f32,
    },
    /// A player arrived
    TravelArrived {
        /// Traveler
        user: UserId,
        /// Destination location id
        location: String,
    },
    /// A travel stopped before arrival
    TravelAborted {
        /// Traveler
        user: UserId,
        /// Destination location id
        to: String,
    },
    /// A used item took effect
    ItemApplied {
        /// Player
        user: UserId,
        /// Item definition id
        item: String,
        /// Life restored
        heal: f32,
    },
    /// A timed buff was removed
    BuffExpired {
        /// Player
        user: UserId,
        /// Item definition id
        item: String,
    },
    /// A player earned experience
    ExpGained {
        /// Player
        user: UserId,
        /// Amount
        amount: u64,
    },
    /// A player reached a new level
    LevelUp {
        /// Player
        user: UserId,
        /// New level
        level: u32,
    },
}

impl SimEvent {
    /// Kind used for handler lookup
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Attacked { .. } => EventKind::Attacked,
            Self::Died { .. } => EventKind::Died,
            Self::Respawned { .. } => EventKind::Respawned,
            Self::MonsterSpawned { .. } => EventKind::MonsterSpawned,
            Self::LootDropped { .. } => EventKind::LootDropped,
            Self::TravelStarted { .. } => EventKind::TravelStarted,
            Self::TravelProgress { .. } => EventKind::TravelProgress,
            Self::TravelArrived { .. } => EventKind::TravelArrived,
            Self::TravelAborted { .. } => EventKind::TravelAborted,
            Self::ItemApplied { .. } => EventKind::ItemApplied,
            Self::BuffExpired { .. } => EventKind::BuffExpired,
            Self::ExpGained { .. } => EventKind::ExpGained,
            Self::LevelUp { .. } => EventKind::LevelUp,
        }
    }
}

/// Event with the simulated time it was raised at
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Payload
    pub payload: SimEvent,
    /// Simulated seconds since the world started
    pub timestamp: f64,
}

/// Event handler
///
/// Returns true if the event was consumed and should not reach later handlers.
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

/// Event queue with per-kind handler registration
#[derive(Default)]
pub struct EventBus {
    queue: Vec<Event>,
    handlers: HashMap<EventKind, Vec<Box<dyn EventHandler>>>,
    current_time: f64,
}

impl EventBus {
    /// Empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Update current time (simulated seconds)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Register a handler for one kind
    pub fn register_handler(&mut self, kind: EventKind, handler: Box<dyn EventHandler>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Queue an event for the next dispatch
    pub fn send(&mut self, payload: SimEvent) {
        self.queue.push(Event { payload, timestamp: self.current_time });
    }

    /// Deliver every queued event
    pub fn dispatch(&mut self) {
        let queue = std::mem::take(&mut self.queue);
        for event in &queue {
            if let Some(handlers) = self.handlers.get_mut(&event.payload.kind()) {
                for handler in handlers.iter_mut() {
                    if handler.on_event(event) {
                        break;
                    }
                }
            }
        }
    }

    /// Queued events not yet dispatched
    pub fn pending(&self) -> &[Event] {
        &self.queue
    }

    /// Drop queued events
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        seen: Rc<RefCell<Vec<EventKind>>>,
        consume: bool,
    }

    impl EventHandler for Recorder {
        fn on_event(&mut self, event: &Event) -> bool {
            self.seen.borrow_mut().push(event.payload.kind());
            self.consume
        }
    }

    fn level_up() -> SimEvent {
        SimEvent::LevelUp { user: 1, level: 2 }
    }

    #[test]
    fn test_dispatch_only_reaches_registered_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.register_handler(EventKind::LevelUp, Box::new(Recorder { seen: seen.clone(), consume: false }));

        bus.send(level_up());
        bus.send(SimEvent::ExpGained { user: 1, amount: 5 });
        assert_eq!(bus.pending().len(), 2);
        bus.dispatch();

        assert_eq!(*seen.borrow(), vec![EventKind::LevelUp]);
        assert!(bus.pending().is_empty());
    }

    #[test]
    fn test_consumed_event_stops_forwarding() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.register_handler(EventKind::LevelUp, Box::new(Recorder { seen: first.clone(), consume: true }));
        bus.register_handler(EventKind::LevelUp, Box::new(Recorder { seen: second.clone(), consume: false }));

        bus.send(level_up());
        bus.dispatch();

        assert_eq!(first.borrow().len(), 1);
        assert!(second.borrow().is_empty());
    }

    #[test]
    fn test_events_carry_timestamp() {
        let mut bus = EventBus::new();
        bus.update_time(2.5);
        bus.send(level_up());
        assert!((bus.pending()[0].timestamp - 2.5).abs() < f64::EPSILON);
        bus.clear();
        assert!(bus.pending().is_empty());
    }
}
