//! Calculation logic for the Facility Wage Engine.
//!
//! This module contains the pure functions that turn a month of session logs
//! into payments: tenure resolution, play record normalization, per-member
//! pricing, facility aggregation, carryover settlement, and the pipeline that
//! runs them in order.

mod carryover;
mod facility;
mod member_wage;
mod normalizer;
mod pipeline;
mod plan_mode;
mod tenure;

pub use carryover::{SettlementResult, settle, settle_month};
pub use facility::{AggregationResult, aggregate, aggregate_with_audit, average_wage};
pub use member_wage::{MemberPricing, price_member};
pub use normalizer::{
    GameMatch, NormalizedSessions, classify_game, is_excluded, labels_match, normalize_sessions,
};
pub use pipeline::calculate_facility_month;
pub use plan_mode::PlanMode;
pub use tenure::{TenureResolution, continuation_months, resolve_tenure, resolve_tier};
