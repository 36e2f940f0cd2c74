//! # Realm Engine
//!
//! Tick-driven simulation core for a persistent multiplayer text game.
//!
//! ## Features
//!
//! - **Attribute Pipeline**: base values plus tagged add/multiply modifiers with cached results
//! - **Entity Kernel**: shared combat and death/respawn lifecycle for players and monsters
//! - **Coroutine Scheduler**: cooperative, time-delayed behavior driven by simulated seconds
//! - **Location Simulation**: spawn timers, gated connections and travel
//! - **World Clock**: fixed-rate loop advancing everything in a fixed phase order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::ops::ControlFlow;
//! use std::sync::Arc;
//! use realm_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let data = Arc::new(StaticData::load("data/world.ron")?);
//!     let mut world = World::new(config.clone(), data)?;
//!     let mut store = MemoryStore::new();
//!
//!     world.login(1, "Ayla", &store)?;
//!
//!     let mut clock = WorldClock::new(&config);
//!     clock.run(&mut world, |world| {
//!         world.flush_saves(&mut store);
//!         ControlFlow::Continue(())
//!     });
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod attributes;
pub mod data;
pub mod entity;
pub mod coroutine;
pub mod location;
pub mod events;
pub mod services;
pub mod world;

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        attributes::{
            Attribute, AttributeModel, AttributeRecord, Equipment, ItemInstance, Modifier,
            ModifierOp, SlotType, SourceTag, StatRecord, StatType,
        },
        config::{Config, ConfigError},
        core::config::EngineConfig,
        coroutine::{Coroutine, CoroutineError, Instruction, Scheduler, Step},
        data::{DataError, StaticData, WorldData},
        entity::{Combatant, DamageResult, DamageType, EntityRef, Monster, Player, UserId},
        events::{EventHandler, EventKind, SimEvent},
        location::{Access, Location},
        services::{
            messaging::{LogMessenger, Messenger},
            persistence::{
                run_save_cycle, MemoryStore, PersistenceStore, PlayerRecord, RonFileStore, SaveReport,
            },
        },
        world::{clock::WorldClock, World, WorldState},
    };
}
