//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types for location placement and travel distance
//! - Fixed-rate tick timing
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
