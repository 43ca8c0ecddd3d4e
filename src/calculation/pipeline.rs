//! The facility-month calculation pipeline.
//!
//! Normalizes each payee's log, prices it, aggregates the facility and
//! settles the carryover, collecting an audit trace along the way. Preview
//! and commit both run through [`calculate_facility_month`].

use std::collections::HashSet;
use std::time::Instant;

use tracing::debug;

use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditTrace, AuditWarning, FacilityMonthInput, MemberWageInput, PlanType, WageRun};

use super::carryover::settle_month;
use super::facility::aggregate_with_audit;
use super::member_wage::price_member;
use super::normalizer::normalize_sessions;
use super::plan_mode::PlanMode;

/// Calculates one facility month from raw session logs.
///
/// # Arguments
///
/// * `input` - The facility, period, plan type and each payee's raw log
/// * `previous_carryover` - The prior month's `next_carryover` (0 if none)
/// * `config` - The loaded wage configuration
///
/// # Errors
///
/// - `MissingMinimumPayment` / `MissingFlatRate` when the policy lacks a
///   constant the run needs
/// - `NoTierConfigured` when a member's tenure falls outside every tier
/// - `InvalidFacilityInput` when a payee appears twice, an entry-plan
///   facility does not have exactly one payee, or the previous carryover is
///   negative
/// - `AmountOverflow` when a wage, the facility total or the carryover
///   balance does not fit in an `i64`
///
/// # Example
///
/// ```no_run
/// use wage_engine::calculation::calculate_facility_month;
/// use wage_engine::config::ConfigLoader;
/// use wage_engine::models::{FacilityMonthInput, Period, PlanType};
///
/// let config = ConfigLoader::load("./config/standard").unwrap();
/// let input = FacilityMonthInput {
///     facility_id: "fac-1".to_string(),
///     period: Period::new(2025, 4).unwrap(),
///     plan_type: PlanType::Tiered,
///     logs: vec![],
///     skipped: vec![],
/// };
/// let run = calculate_facility_month(&input, 0, &config).unwrap();
/// assert_eq!(run.facility.total_amount, 0);
/// ```
pub fn calculate_facility_month(
    input: &FacilityMonthInput,
    previous_carryover: i64,
    config: &ConfigLoader,
) -> EngineResult<WageRun> {
    let start = Instant::now();

    let minimum_payment = config.minimum_payment()?;
    let wage_config = config.config();
    let mode = PlanMode::for_plan(input.plan_type, config)?;
    validate_roster(input)?;
    if previous_carryover < 0 {
        return Err(EngineError::InvalidFacilityInput {
            facility_id: input.facility_id.clone(),
            message: format!("previous carryover must not be negative, got {}", previous_carryover),
        });
    }

    let mut steps = Vec::new();
    let mut warnings = Vec::new();
    let mut members = Vec::with_capacity(input.logs.len());
    let mut excluded_total = 0u32;

    for log in &input.logs {
        let normalized = normalize_sessions(&log.rows, wage_config.catalog());
        excluded_total += normalized.excluded_count;

        let member_input = MemberWageInput {
            profile: log.profile.clone(),
            sessions: normalized.records,
        };
        let pricing = price_member(&member_input, &mode, input.period, next_step(&steps))?;

        steps.extend(pricing.audit_steps);
        warnings.extend(pricing.warnings);
        members.push(pricing.result);
    }

    for skipped in &input.skipped {
        warnings.push(AuditWarning::new(
            "MEMBER_SKIPPED",
            format!(
                "Member '{}' was left out of the run: {}",
                skipped.user_id, skipped.reason
            ),
            "high",
        ));
    }

    let aggregation = aggregate_with_audit(
        &input.facility_id,
        input.period,
        input.plan_type,
        members,
        input.skipped.clone(),
        next_step(&steps),
    )?;
    steps.push(aggregation.audit_step);
    let facility = aggregation.facility;

    let settlement = settle_month(
        facility.total_amount,
        previous_carryover,
        minimum_payment,
        next_step(&steps),
    )?;
    steps.push(settlement.audit_step);

    debug!(
        facility_id = %input.facility_id,
        period = %input.period,
        total_amount = facility.total_amount,
        excluded_rows = excluded_total,
        payment_amount = settlement.state.payment_amount,
        "Facility month calculated"
    );

    Ok(WageRun {
        facility,
        carryover: settlement.state,
        audit_trace: AuditTrace {
            steps,
            warnings,
            duration_us: start.elapsed().as_micros() as u64,
        },
    })
}

fn next_step(steps: &[crate::models::AuditStep]) -> u32 {
    steps.len() as u32 + 1
}

fn validate_roster(input: &FacilityMonthInput) -> EngineResult<()> {
    let invalid = |message: String| EngineError::InvalidFacilityInput {
        facility_id: input.facility_id.clone(),
        message,
    };

    let mut seen = HashSet::new();
    let ids = input
        .logs
        .iter()
        .map(|log| log.profile.user_id.as_str())
        .chain(input.skipped.iter().map(|s| s.user_id.as_str()));
    for user_id in ids {
        if !seen.insert(user_id) {
            return Err(invalid(format!("member '{}' appears more than once", user_id)));
        }
    }

    let payees = input.logs.len() + input.skipped.len();
    if input.plan_type == PlanType::Entry && payees != 1 {
        return Err(invalid(format!(
            "entry-plan facilities are paid as a single payee, got {}",
            payees
        )));
    }

    Ok(())
}
