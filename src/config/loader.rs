//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the wage
//! program configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{
    GameCatalog, PaymentPolicy, ProgramMetadata, RateTier, TiersConfig, WageConfig,
};

/// Loads and provides access to wage configuration.
///
/// # Directory Structure
///
/// ```text
/// config/standard/
/// ├── program.yaml   # Program metadata
/// ├── tiers.yaml     # Tenure rate tiers, in resolution order
/// ├── payment.yaml   # Entry flat rate and minimum payment
/// └── games.yaml     # Game catalog and excluded journal labels
/// ```
///
/// # Example
///
/// ```no_run
/// use wage_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/standard").unwrap();
/// let minimum = loader.minimum_payment().unwrap();
/// println!("Minimum payment: {}", minimum);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: WageConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - A tier has an inverted range, a blank name or a negative rate
    /// - A catalog entry has a blank name
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<ProgramMetadata>(&path.join("program.yaml"))?;

        let tiers_path = path.join("tiers.yaml");
        let tiers = Self::load_yaml::<TiersConfig>(&tiers_path)?.tiers;
        Self::validate_tiers(&tiers, &tiers_path)?;

        let payment = Self::load_yaml::<PaymentPolicy>(&path.join("payment.yaml"))?;

        let games_path = path.join("games.yaml");
        let catalog = Self::load_yaml::<GameCatalog>(&games_path)?;
        Self::validate_catalog(&catalog, &games_path)?;

        Ok(Self::from_config(WageConfig::new(
            metadata, tiers, payment, catalog,
        )))
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: WageConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn validate_tiers(tiers: &[RateTier], path: &Path) -> EngineResult<()> {
        match tiers.iter().find_map(RateTier::validation_error) {
            Some(message) => Err(EngineError::ConfigParseError {
                path: path.display().to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    fn validate_catalog(catalog: &GameCatalog, path: &Path) -> EngineResult<()> {
        let blank_game = catalog.games.iter().any(|g| g.name.trim().is_empty());
        let blank_label = catalog.excluded_labels.iter().any(|l| l.trim().is_empty());
        if blank_game || blank_label {
            return Err(EngineError::ConfigParseError {
                path: path.display().to_string(),
                message: "game names and excluded labels must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the underlying wage configuration.
    pub fn config(&self) -> &WageConfig {
        &self.config
    }

    /// Returns the program metadata.
    pub fn program(&self) -> &ProgramMetadata {
        self.config.program()
    }

    /// Returns the configured minimum payment threshold.
    ///
    /// Fails with `MissingMinimumPayment` when `payment.yaml` leaves it out.
    pub fn minimum_payment(&self) -> EngineResult<i64> {
        self.config
            .payment()
            .minimum_payment
            .ok_or(EngineError::MissingMinimumPayment)
    }

    /// Returns the configured entry-plan flat rate.
    ///
    /// Fails with `MissingFlatRate` when `payment.yaml` leaves it out.
    pub fn entry_flat_rate(&self) -> EngineResult<i64> {
        self.config
            .payment()
            .entry_flat_rate
            .ok_or(EngineError::MissingFlatRate)
    }
}
