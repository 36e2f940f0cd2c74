//! # Core Engine Module
//!
//! Shared configuration for every simulation subsystem.
//!
//! ## Organization
//!
//! - **Config**: tuning values for the tick loop, entity lifecycle,
//!   player progression and travel

pub mod config;

// Re-export commonly used config types
pub use config::EngineConfig;
pub use crate::config::{Config, ConfigError};
