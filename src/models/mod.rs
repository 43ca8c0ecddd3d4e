//! Core data models for the Facility Wage Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod calculation_result;
mod carryover;
mod member;
mod period;
mod session;
mod wage_result;

pub use calculation_result::{AuditStep, AuditTrace, AuditWarning, WageCalculation, WageRun};
pub use carryover::{CarryoverRecord, CarryoverState, MonthStatus};
pub use member::{
    FacilityMonthInput, FacilityRoster, MemberProfile, MemberSessionLog, MemberWageInput, PlanType,
    Tenure,
};
pub use period::Period;
pub use session::{GameLevel, PlaySessionRecord, RawSessionRow};
pub use wage_result::{FacilityWageResult, GameWageLine, MemberWageResult, SkippedMember};
