//! Tenure resolution functionality.
//!
//! This module computes how many whole months a member has been enrolled and
//! maps that tenure to a configured rate tier.

use chrono::NaiveDate;

use crate::config::RateTier;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning, MemberProfile, Period, Tenure};

/// The result of resolving a member's tenure, including the tier and audit step.
#[derive(Debug, Clone)]
pub struct TenureResolution<'a> {
    /// Whole months of enrollment used for tier selection.
    pub months: u32,
    /// The selected tier.
    pub tier: &'a RateTier,
    /// Set when the roster supplied a negative month count.
    pub warning: Option<AuditWarning>,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Counts whole calendar months from the start date's month to the target month.
///
/// Both ends are taken at the first day of their month, so the day of the
/// start date never matters. Members who join after the target month have
/// zero months, never a negative count.
///
/// # Examples
///
/// ```
/// use wage_engine::calculation::continuation_months;
/// use wage_engine::models::Period;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 11, 28).unwrap();
/// assert_eq!(continuation_months(start, Period::new(2025, 4).unwrap()), 5);
/// assert_eq!(continuation_months(start, Period::new(2024, 10).unwrap()), 0);
/// ```
pub fn continuation_months(start_date: NaiveDate, period: Period) -> u32 {
    let elapsed = period.month_index() - Period::containing(start_date).month_index();
    u32::try_from(elapsed.max(0)).unwrap_or(u32::MAX)
}

/// Selects the first tier, in configured order, whose range contains `months`.
///
/// Overlapping boundaries are therefore won by the earlier tier.
///
/// # Errors
///
/// Returns `NoTierConfigured` if no tier covers the tenure.
pub fn resolve_tier(months: u32, tiers: &[RateTier]) -> EngineResult<&RateTier> {
    tiers
        .iter()
        .find(|tier| tier.contains(months))
        .ok_or(EngineError::NoTierConfigured { months })
}

/// Resolves a member's tenure against the target period and picks a tier.
pub fn resolve_tenure<'a>(
    profile: &MemberProfile,
    period: Period,
    tiers: &'a [RateTier],
    step_number: u32,
) -> EngineResult<TenureResolution<'a>> {
    let (months, source, warning) = match profile.tenure {
        Tenure::StartDate(start_date) => (
            continuation_months(start_date, period),
            format!("start_date {}", start_date),
            None,
        ),
        Tenure::ContinuationMonths(raw) if raw < 0 => (
            0,
            format!("continuation_months {} (clamped)", raw),
            Some(AuditWarning::new(
                "NEGATIVE_TENURE",
                format!(
                    "Member '{}' has negative continuation months ({}); treated as 0",
                    profile.user_id, raw
                ),
                "low",
            )),
        ),
        Tenure::ContinuationMonths(raw) => (
            u32::try_from(raw).unwrap_or(u32::MAX),
            format!("continuation_months {}", raw),
            None,
        ),
    };

    let tier = resolve_tier(months, tiers)?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "tenure_resolution".to_string(),
        rule_name: "Tenure Resolution".to_string(),
        input: serde_json::json!({
            "user_id": profile.user_id,
            "tenure": source,
            "period": period.to_string()
        }),
        output: serde_json::json!({
            "continuation_months": months,
            "tier": tier.name
        }),
        reasoning: format!(
            "{} month(s) of tenure selects tier '{}'",
            months, tier.name
        ),
    };

    Ok(TenureResolution {
        months,
        tier,
        warning,
        audit_step,
    })
}
