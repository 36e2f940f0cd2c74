//! # Engine Configuration
//!
//! Tuning values for the simulation core. Every field has a default so a
//! config file only needs to name what it overrides.
//!
//! ## Configuration Categories
//!
//! - **Loop**: tick rate and catch-up policy of the world clock
//! - **Lifecycle**: regeneration, death timers, respawn location
//! - **Progression**: experience curve and stat points
//! - **Travel**: speed floor and progress notification interval

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// # Engine Configuration
///
/// Core simulation behavior shared by the world, its entities and the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// World clock frequency
    pub tick_rate_hz: u32,
    /// How many periods the clock may fall behind before it re-anchors its schedule
    pub max_catch_up_ticks: u32,
    /// Life restored every tick while alive and below max
    pub life_regen_per_tick: f32,
    /// Mentality restored every tick while alive and below max
    pub mentality_regen_per_tick: f32,
    /// Seconds a dead player waits before respawning
    pub player_death_time: f32,
    /// Location dead players are moved to on respawn (`None` respawns in place)
    pub player_respawn_location: Option<String>,
    /// Location assigned to freshly created players (`None` uses the first location in data)
    pub start_location: Option<String>,
    /// Hunger lost per simulated second
    pub hunger_decay_per_sec: f32,
    /// Thirst lost per simulated second
    pub thirst_decay_per_sec: f32,
    /// Experience needed per level (threshold is `exp_per_level * level`)
    pub exp_per_level: u64,
    /// Unspent stat points awarded on level up
    pub stat_points_per_level: u32,
    /// Floor applied to the speed attribute when computing travel time
    pub min_travel_speed: f32,
    /// Longest gap between travel progress notifications, in simulated seconds (at most 1)
    pub travel_progress_interval: f32,
    /// Seconds between autosaves of active players
    pub autosave_interval_secs: f32,
    /// Seed for loot and critical-hit rolls
    pub rng_seed: u64,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            tick_rate_hz: 20,
            max_catch_up_ticks: 5,
            life_regen_per_tick: 0.05,
            mentality_regen_per_tick: 0.05,
            player_death_time: 10.0,
            player_respawn_location: None,
            start_location: None,
            hunger_decay_per_sec: 0.01,
            thirst_decay_per_sec: 0.015,
            exp_per_level: 100,
            stat_points_per_level: 3,
            min_travel_speed: 0.01,
            travel_progress_interval: 1.0,
            autosave_interval_secs: 60.0,
            rng_seed: 0x5EED,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set tick rate
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    /// Set per-tick life regeneration
    pub fn with_life_regen(mut self, per_tick: f32) -> Self {
        self.life_regen_per_tick = per_tick;
        self
    }

    /// Set RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Nominal tick length in seconds
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("Tick rate must be at least 1 Hz".to_string());
        }

        if self.player_death_time < 0.0 {
            return Err("Player death time cannot be negative".to_string());
        }

        if self.travel_progress_interval <= 0.0 || self.travel_progress_interval > 1.0 {
            return Err("Travel progress interval must be in (0, 1] seconds".to_string());
        }

        if self.exp_per_level == 0 {
            return Err("Experience per level must be positive".to_string());
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_rate_hz, 20);
        assert!((config.tick_seconds() - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str("tick_rate_hz = 10\nplayer_death_time = 5.0").unwrap();
        assert_eq!(config.tick_rate_hz, 10);
        assert!((config.player_death_time - 5.0).abs() < f32::EPSILON);
        assert_eq!(config.exp_per_level, 100);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let config = EngineConfig::default().with_tick_rate(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_progress_interval_above_one_second_rejected() {
        let config = EngineConfig { travel_progress_interval: 2.5, ..EngineConfig::default() };
        assert!(config.validate().is_err());
        let config = EngineConfig { travel_progress_interval: 0.25, ..EngineConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip_through_files() {
        let dir = std::env::temp_dir().join(format!("realm_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine.ron");

        let config = EngineConfig::default().with_seed(42).with_log_level("debug");
        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = EngineConfig::load_from_file("engine.yaml");
        assert!(matches!(result, Err(crate::config::ConfigError::UnsupportedFormat(_))));
    }
}
