//! Configuration management
//!
//! Simulation settings: how many miners and clients run, the chain height at
//! which mining stops, client pacing and whether loaded chains are re-verified.

pub mod settings;

pub use settings::{SimulationConfig, DEFAULT_CONFIG_PATH};
