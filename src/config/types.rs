//! Configuration types for wage calculation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use serde::{Deserialize, Serialize};

use crate::models::GameLevel;

/// Metadata about the wage program.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramMetadata {
    /// Short identifier of the program (e.g., "standard").
    pub code: String,
    /// The human-readable name of the program.
    pub name: String,
    /// The version or effective date of the schedule.
    pub version: String,
}

/// Per-session rates for each game level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRates {
    /// Rate for level 1 games.
    pub level_1: i64,
    /// Rate for level 2 games.
    pub level_2: i64,
    /// Rate for level 3 games.
    pub level_3: i64,
    /// Rate for level 4 games.
    pub level_4: i64,
}

impl LevelRates {
    /// Returns the rate for a level.
    pub fn for_level(&self, level: GameLevel) -> i64 {
        match level.get() {
            1 => self.level_1,
            2 => self.level_2,
            3 => self.level_3,
            _ => self.level_4,
        }
    }

    fn iter(&self) -> impl Iterator<Item = i64> {
        [self.level_1, self.level_2, self.level_3, self.level_4].into_iter()
    }
}

/// A tenure bracket and its per-level rates.
///
/// # Example
///
/// ```
/// use wage_engine::config::{LevelRates, RateTier};
/// use wage_engine::models::GameLevel;
///
/// let tier = RateTier {
///     name: "4-9 months".to_string(),
///     min_months: 4,
///     max_months: Some(9),
///     rates: LevelRates { level_1: 60, level_2: 70, level_3: 80, level_4: 90 },
/// };
/// assert!(tier.contains(9));
/// assert!(!tier.contains(10));
/// assert_eq!(tier.rate(GameLevel::new(2).unwrap()), 70);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    /// Display name of the tier.
    pub name: String,
    /// First month covered (inclusive).
    pub min_months: u32,
    /// Last month covered (inclusive); `None` means open-ended.
    #[serde(default)]
    pub max_months: Option<u32>,
    /// Per-level session rates.
    pub rates: LevelRates,
}

impl RateTier {
    /// Returns true if the tier covers the given tenure.
    pub fn contains(&self, months: u32) -> bool {
        months >= self.min_months && self.max_months.is_none_or(|max| months <= max)
    }

    /// Returns the per-session rate for a level.
    pub fn rate(&self, level: GameLevel) -> i64 {
        self.rates.for_level(level)
    }

    /// Returns a description of the first problem with the tier, if any.
    pub(crate) fn validation_error(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("tier name must not be blank".to_string());
        }
        if let Some(max) = self.max_months.filter(|max| *max < self.min_months) {
            return Some(format!(
                "tier '{}' ends ({}) before it starts ({})",
                self.name, max, self.min_months
            ));
        }
        if self.rates.iter().any(|rate| rate < 0) {
            return Some(format!("tier '{}' has a negative rate", self.name));
        }
        None
    }
}

/// Rate tiers file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct TiersConfig {
    /// Tiers in resolution order.
    pub tiers: Vec<RateTier>,
}

/// Payment policy constants.
///
/// Both values are optional in the file so that a missing constant is
/// reported when a run needs it rather than silently defaulted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentPolicy {
    /// Per-session rate for entry-plan facilities.
    #[serde(default)]
    pub entry_flat_rate: Option<i64>,
    /// Combined balances below this amount are deferred to the next month.
    #[serde(default)]
    pub minimum_payment: Option<i64>,
}

/// A catalog entry mapping a game name to its difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEntry {
    /// Canonical game name.
    pub name: String,
    /// Difficulty level.
    pub level: GameLevel,
}

/// The game catalog and the journal-prompt labels that are not games.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCatalog {
    /// Known games in matching order.
    pub games: Vec<GameEntry>,
    /// Log labels for non-game journal entries.
    #[serde(default)]
    pub excluded_labels: Vec<String>,
}

/// The complete wage configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct WageConfig {
    metadata: ProgramMetadata,
    tiers: Vec<RateTier>,
    payment: PaymentPolicy,
    catalog: GameCatalog,
}

impl WageConfig {
    /// Creates a new WageConfig from its component parts.
    ///
    /// Tier order is kept as given: it decides which tier wins at an
    /// overlapping boundary.
    pub fn new(
        metadata: ProgramMetadata,
        tiers: Vec<RateTier>,
        payment: PaymentPolicy,
        catalog: GameCatalog,
    ) -> Self {
        Self {
            metadata,
            tiers,
            payment,
            catalog,
        }
    }

    /// Returns the program metadata.
    pub fn program(&self) -> &ProgramMetadata {
        &self.metadata
    }

    /// Returns the rate tiers in resolution order.
    pub fn tiers(&self) -> &[RateTier] {
        &self.tiers
    }

    /// Returns the payment policy.
    pub fn payment(&self) -> &PaymentPolicy {
        &self.payment
    }

    /// Returns the game catalog.
    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }
}
