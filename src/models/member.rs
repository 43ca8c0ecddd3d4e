//! Member and facility input models.
//!
//! This module defines the roster entries and per-member session inputs
//! consumed by the wage calculator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Period, PlaySessionRecord, RawSessionRow, SkippedMember};

/// The facility's wage plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Entry plan: one flat rate per session, tracked for the facility as a whole.
    Entry,
    /// Tiered plan: per-member rates by tenure and game level.
    Tiered,
}

impl PlanType {
    /// Returns the wire name of the plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Entry => "entry",
            PlanType::Tiered => "tiered",
        }
    }
}

/// How long a member has been enrolled.
///
/// Serialized as `{"start_date": "2024-01-10"}` or `{"continuation_months": 5}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenure {
    /// Enrollment start date; months are derived against the target period.
    StartDate(NaiveDate),
    /// Months already computed by the roster source. Negative values are clamped to 0.
    ContinuationMonths(i64),
}

/// A member as listed on the facility roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    /// Unique identifier of the member.
    pub user_id: String,
    /// Display name of the member.
    pub user_name: String,
    /// Enrollment tenure.
    pub tenure: Tenure,
}

impl MemberProfile {
    /// Builds the single aggregate payee used by entry-plan facilities.
    pub fn facility_payee(facility_id: &str, facility_name: &str) -> Self {
        Self {
            user_id: facility_id.to_string(),
            user_name: facility_name.to_string(),
            tenure: Tenure::ContinuationMonths(0),
        }
    }
}

/// A member's raw session log for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSessionLog {
    /// The roster entry.
    pub profile: MemberProfile,
    /// Rows exactly as read from the log export.
    pub rows: Vec<RawSessionRow>,
}

/// A member's normalized sessions, ready for pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberWageInput {
    /// The roster entry.
    pub profile: MemberProfile,
    /// Sessions with exclusions removed and levels resolved.
    pub sessions: Vec<PlaySessionRecord>,
}

/// Everything the pipeline needs to price one facility month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityMonthInput {
    /// The facility being calculated.
    pub facility_id: String,
    /// The target month.
    pub period: Period,
    /// The facility's wage plan.
    pub plan_type: PlanType,
    /// One log per payee; entry plans carry exactly one.
    pub logs: Vec<MemberSessionLog>,
    /// Payees whose logs could not be fetched.
    #[serde(default)]
    pub skipped: Vec<SkippedMember>,
}

/// A facility's payees for one month, before any session log is fetched.
///
/// Tiered facilities list their members; entry-plan facilities leave
/// `members` empty and are paid as a single facility payee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityRoster {
    /// Facility identifier.
    pub facility_id: String,
    /// Facility display name, used for the entry-plan payee.
    pub facility_name: String,
    /// How the facility is paid.
    pub plan_type: PlanType,
    /// Members of a tiered facility.
    #[serde(default)]
    pub members: Vec<MemberProfile>,
}
