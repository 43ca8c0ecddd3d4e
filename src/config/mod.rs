//! Configuration loading and management for the Facility Wage Engine.
//!
//! This module provides functionality to load the wage program from YAML
//! files: program metadata, tenure rate tiers, payment policy constants and
//! the game catalog.
//!
//! # Example
//!
//! ```no_run
//! use wage_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/standard").unwrap();
//! println!("Loaded program: {}", config.program().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    GameCatalog, GameEntry, LevelRates, PaymentPolicy, ProgramMetadata, RateTier, TiersConfig,
    WageConfig,
};
