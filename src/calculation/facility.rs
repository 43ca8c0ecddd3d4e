//! Facility aggregation functionality.
//!
//! Rolls priced members up into the facility's monthly totals.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, FacilityWageResult, MemberWageResult, Period, PlanType, SkippedMember,
};

/// The aggregated facility result and its audit step.
#[derive(Debug, Clone)]
pub struct AggregationResult {
    /// The facility totals.
    pub facility: FacilityWageResult,
    /// The audit step recording the aggregation.
    pub audit_step: AuditStep,
}

/// Average wage per member, rounded to 2 decimal places.
///
/// Midpoints round away from zero. A facility with no members averages 0.
///
/// # Examples
///
/// ```
/// use wage_engine::calculation::average_wage;
/// use rust_decimal::Decimal;
///
/// assert_eq!(average_wage(1000, 3), Decimal::new(33333, 2));
/// assert_eq!(average_wage(5, 2), Decimal::new(250, 2));
/// assert_eq!(average_wage(0, 0), Decimal::ZERO);
/// ```
pub fn average_wage(total_amount: i64, member_count: u32) -> Decimal {
    if member_count == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(total_amount) / Decimal::from(member_count))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sums priced members into a [`FacilityWageResult`].
///
/// Member order is preserved as given.
///
/// # Errors
///
/// Returns `AmountOverflow` if the facility total does not fit in an `i64`.
pub fn aggregate(
    facility_id: &str,
    period: Period,
    plan_type: PlanType,
    members: Vec<MemberWageResult>,
    skipped: Vec<SkippedMember>,
) -> EngineResult<FacilityWageResult> {
    let total_amount = members
        .iter()
        .try_fold(0i64, |total, m| total.checked_add(m.total_wage))
        .ok_or_else(|| EngineError::AmountOverflow {
            context: format!("total for facility '{}'", facility_id),
        })?;
    let total_play_count = members
        .iter()
        .fold(0u32, |total, m| total.saturating_add(m.valid_play_count));
    let member_count = u32::try_from(members.len()).unwrap_or(u32::MAX);

    Ok(FacilityWageResult {
        facility_id: facility_id.to_string(),
        year: period.year,
        month: period.month,
        plan_type,
        members,
        total_amount,
        member_count,
        total_play_count,
        average_wage_per_member: average_wage(total_amount, member_count),
        skipped_members: skipped,
    })
}

/// Aggregates and records an audit step for the result.
pub fn aggregate_with_audit(
    facility_id: &str,
    period: Period,
    plan_type: PlanType,
    members: Vec<MemberWageResult>,
    skipped: Vec<SkippedMember>,
    step_number: u32,
) -> EngineResult<AggregationResult> {
    let facility = aggregate(facility_id, period, plan_type, members, skipped)?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "facility_aggregation".to_string(),
        rule_name: "Facility Aggregation".to_string(),
        input: serde_json::json!({
            "facility_id": facility.facility_id,
            "period": period.to_string(),
            "plan_type": plan_type.as_str(),
            "skipped_members": facility.skipped_members.len()
        }),
        output: serde_json::json!({
            "member_count": facility.member_count,
            "total_amount": facility.total_amount,
            "total_play_count": facility.total_play_count,
            "average_wage_per_member": facility.average_wage_per_member.to_string()
        }),
        reasoning: format!(
            "{} member(s) earned {} over {} session(s)",
            facility.member_count, facility.total_amount, facility.total_play_count
        ),
    };

    Ok(AggregationResult {
        facility,
        audit_step,
    })
}
