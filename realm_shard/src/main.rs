//! Realm shard
//!
//! Hosts a single world: loads static data, logs in the configured
//! accounts and runs the world clock with periodic autosaves.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use realm_engine::config::{Config, ConfigError};
use realm_engine::data::DataError;
use realm_engine::foundation::logging;
use realm_engine::prelude::*;
use realm_engine::services::persistence::PersistenceError;
use realm_engine::world::SessionError;

const DEFAULT_CONFIG_PATH: &str = "realm.toml";

/// Account logged in as soon as the shard starts
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AutoLogin {
    user: UserId,
    name: String,
}

/// Shard settings, read from `realm.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct ShardConfig {
    engine: EngineConfig,
    data_path: PathBuf,
    save_dir: PathBuf,
    /// Stop after this many ticks (`None` runs until killed)
    run_ticks: Option<u64>,
    autologin: Vec<AutoLogin>,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            data_path: PathBuf::from("crates/realm_engine/data/world.ron"),
            save_dir: PathBuf::from("saves"),
            run_ticks: None,
            autologin: Vec::new(),
        }
    }
}

impl Config for ShardConfig {}

#[derive(thiserror::Error, Debug)]
enum ShardError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("world data: {0}")]
    Data(#[from] DataError),

    #[error("storage: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("session: {0}")]
    Session(#[from] SessionError),
}

fn main() -> Result<(), ShardError> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = ShardConfig::load_or_default(&config_path)?;
    config.engine.validate().map_err(ShardError::InvalidConfig)?;

    logging::init(&config.engine.log_level);
    info!("Starting realm shard with {}", config_path.display());

    let data = Arc::new(StaticData::load(&config.data_path)?);
    info!("Loaded world data from {}", config.data_path.display());

    let mut world = World::new(config.engine.clone(), data)?.with_messenger(Rc::new(LogMessenger));
    let mut store = RonFileStore::new(&config.save_dir)?;

    for account in &config.autologin {
        let player = world.login(account.user, &account.name, &store)?;
        info!("{} logged in at {}", player.name(), player.location());
    }

    let autosave = f64::from(config.engine.autosave_interval_secs);
    let mut last_autosave = 0.0;
    let run_ticks = config.run_ticks;
    let mut ticks = 0_u64;

    let mut clock = WorldClock::new(&config.engine);
    clock.run(&mut world, |world| {
        ticks += 1;

        let now = world.state().elapsed();
        if autosave > 0.0 && now - last_autosave >= autosave {
            last_autosave = now;
            let queued = world.queue_all_saves();
            if queued > 0 {
                info!("Autosave queued {queued} player(s)");
            }
        }

        let report = world.flush_saves(&mut store);
        if report.failed > 0 {
            warn!("Save cycle: {} saved, {} failed", report.saved, report.failed);
        }

        match run_ticks {
            Some(limit) if ticks >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });

    let logged_out = world.logout_all();
    let report = world.flush_saves(&mut store);
    info!(
        "Shutdown: {} player(s) logged out, {} saved, {} failed",
        logged_out, report.saved, report.failed
    );
    for user in world.unsaved_players() {
        log::error!("Changes of player {user} could not be saved before shutdown");
    }

    Ok(())
}
