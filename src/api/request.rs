//! Request types for the Facility Wage Engine API.
//!
//! This module defines the JSON request bodies for the preview and commit
//! endpoints and their conversion into domain inputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    FacilityMonthInput, FacilityRoster, MemberProfile, MemberSessionLog, Period, PlanType,
    RawSessionRow, Tenure,
};

/// Request body for `POST /wages/preview`.
///
/// Carries the whole month inline: payees, their session rows and the
/// carryover entering the month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    /// The facility being calculated.
    pub facility_id: String,
    /// Target year.
    pub year: i32,
    /// Target month (1-12).
    pub month: u32,
    /// How the facility is paid.
    pub plan_type: PlanType,
    /// Payees and their session rows.
    pub members: Vec<MemberLogRequest>,
    /// The carryover entering the month.
    #[serde(default)]
    pub previous_carryover: i64,
}

/// A roster entry in a request.
///
/// Tenure is given either as `start_date` or as a precomputed
/// `continuation_months`, not both. Entry-plan payees may omit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRequest {
    /// Member identifier.
    pub user_id: String,
    /// Member display name.
    pub user_name: String,
    /// Enrollment start date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Precomputed whole months of enrollment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_months: Option<i64>,
}

/// A payee with inline session rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberLogRequest {
    /// The payee.
    #[serde(flatten)]
    pub member: MemberRequest,
    /// Raw activity-log rows for the month.
    #[serde(default)]
    pub sessions: Vec<SessionRequest>,
}

/// A raw activity-log row in a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    /// The day the session was played.
    pub date: NaiveDate,
    /// The game name as written in the log.
    pub game_name: String,
}

/// Request body for `POST /facilities/:facility_id/wages/:year/:month/commit`.
///
/// Session rows are fetched from the configured source, so only the roster
/// is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRequest {
    /// Facility display name, used for the entry-plan payee.
    #[serde(default)]
    pub facility_name: String,
    /// How the facility is paid.
    pub plan_type: PlanType,
    /// Members of a tiered facility; empty for the entry plan.
    #[serde(default)]
    pub members: Vec<MemberRequest>,
}

impl MemberRequest {
    fn into_profile(self, facility_id: &str, plan_type: PlanType) -> EngineResult<MemberProfile> {
        let tenure = match (self.start_date, self.continuation_months, plan_type) {
            (Some(start_date), None, _) => Tenure::StartDate(start_date),
            (None, Some(months), _) => Tenure::ContinuationMonths(months),
            (None, None, PlanType::Entry) => Tenure::ContinuationMonths(0),
            (Some(_), Some(_), _) => {
                return Err(invalid_member(
                    facility_id,
                    &self.user_id,
                    "give either start_date or continuation_months, not both",
                ));
            }
            (None, None, PlanType::Tiered) => {
                return Err(invalid_member(
                    facility_id,
                    &self.user_id,
                    "start_date or continuation_months is required",
                ));
            }
        };

        Ok(MemberProfile {
            user_id: self.user_id,
            user_name: self.user_name,
            tenure,
        })
    }
}

fn invalid_member(facility_id: &str, user_id: &str, message: &str) -> EngineError {
    EngineError::InvalidFacilityInput {
        facility_id: facility_id.to_string(),
        message: format!("member '{}': {}", user_id, message),
    }
}

impl From<SessionRequest> for RawSessionRow {
    fn from(req: SessionRequest) -> Self {
        RawSessionRow::new(req.date, req.game_name)
    }
}

impl PreviewRequest {
    /// Converts the request into a pipeline input and the previous carryover.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod` for an out-of-range month, `InvalidFacilityInput` for a
    /// negative previous carryover or a member without usable tenure.
    pub fn into_input(self) -> EngineResult<(FacilityMonthInput, i64)> {
        let period = Period::new(self.year, self.month)?;
        if self.previous_carryover < 0 {
            return Err(EngineError::InvalidFacilityInput {
                facility_id: self.facility_id,
                message: format!(
                    "previous_carryover must not be negative, got {}",
                    self.previous_carryover
                ),
            });
        }
        let facility_id = self.facility_id;
        let plan_type = self.plan_type;

        let logs = self
            .members
            .into_iter()
            .map(|entry| {
                Ok(MemberSessionLog {
                    profile: entry.member.into_profile(&facility_id, plan_type)?,
                    rows: entry.sessions.into_iter().map(Into::into).collect(),
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok((
            FacilityMonthInput {
                facility_id,
                period,
                plan_type,
                logs,
                skipped: vec![],
            },
            self.previous_carryover,
        ))
    }
}

impl CommitRequest {
    /// Converts the request into the facility's roster.
    pub fn into_roster(self, facility_id: &str) -> EngineResult<FacilityRoster> {
        let plan_type = self.plan_type;
        let members = self
            .members
            .into_iter()
            .map(|member| member.into_profile(facility_id, plan_type))
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(FacilityRoster {
            facility_id: facility_id.to_string(),
            facility_name: self.facility_name,
            plan_type,
            members,
        })
    }
}
