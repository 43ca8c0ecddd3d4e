//! Plan mode dispatch.
//!
//! A facility is either on the entry plan (one flat rate per session, paid to
//! the facility as a single payee) or on the tiered plan (per-member rates by
//! tenure and game level). The mode is chosen once per facility run.

use crate::config::{ConfigLoader, RateTier};
use crate::error::EngineResult;
use crate::models::PlanType;

/// How sessions are priced for one facility run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode<'a> {
    /// Every classified session earns the same rate.
    Flat {
        /// Rate per session.
        rate: i64,
    },
    /// Sessions are priced by the member's tenure tier and the game level.
    Tiered {
        /// Tiers in resolution order.
        tiers: &'a [RateTier],
    },
}

impl<'a> PlanMode<'a> {
    /// Selects the pricing mode for a facility's plan type.
    ///
    /// # Errors
    ///
    /// Returns `MissingFlatRate` for an entry-plan facility when no flat rate
    /// is configured.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wage_engine::calculation::PlanMode;
    /// use wage_engine::config::ConfigLoader;
    /// use wage_engine::models::PlanType;
    ///
    /// let config = ConfigLoader::load("./config/standard").unwrap();
    /// let mode = PlanMode::for_plan(PlanType::Entry, &config).unwrap();
    /// assert_eq!(mode, PlanMode::Flat { rate: 80 });
    /// ```
    pub fn for_plan(plan_type: PlanType, config: &'a ConfigLoader) -> EngineResult<Self> {
        match plan_type {
            PlanType::Entry => Ok(PlanMode::Flat {
                rate: config.entry_flat_rate()?,
            }),
            PlanType::Tiered => Ok(PlanMode::Tiered {
                tiers: config.config().tiers(),
            }),
        }
    }

    /// Returns the plan type this mode prices for.
    pub fn plan_type(&self) -> PlanType {
        match self {
            PlanMode::Flat { .. } => PlanType::Entry,
            PlanMode::Tiered { .. } => PlanType::Tiered,
        }
    }
}
