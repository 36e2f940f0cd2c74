//! Cross-module scenarios driven through the world

mod combat;
mod timed;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::core::config::EngineConfig;
use crate::data::StaticData;
use crate::events::{Event, EventHandler, EventKind, SimEvent};
use crate::services::persistence::MemoryStore;
use crate::world::World;

/// Handler keeping every dispatched event
struct EventLog(Rc<RefCell<Vec<SimEvent>>>);

impl EventHandler for EventLog {
    fn on_event(&mut self, event: &Event) -> bool {
        self.0.borrow_mut().push(event.payload.clone());
        false
    }
}

fn sample_data() -> Arc<StaticData> {
    Arc::new(StaticData::parse(include_str!("../../data/world.ron")).unwrap())
}

/// World over the sample data with player 1 logged in
fn world_with_player(config: EngineConfig) -> (World, Rc<RefCell<Vec<SimEvent>>>) {
    let mut world = World::new(config, sample_data()).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in EventKind::ALL {
        world.register_handler(kind, Box::new(EventLog(log.clone())));
    }
    world.login(1, "Ayla", &MemoryStore::new()).unwrap();
    (world, log)
}

fn ticks(world: &mut World, count: usize, dt: f32) {
    for _ in 0..count {
        world.tick(dt);
    }
}

fn count(log: &Rc<RefCell<Vec<SimEvent>>>, kind: EventKind) -> usize {
    log.borrow().iter().filter(|e| e.kind() == kind).count()
}
