//! Per-member wage calculation.
//!
//! Prices one member's normalized sessions for a month and builds the
//! per-game breakdown shown on the payment notice.

use std::collections::HashMap;

use crate::config::RateTier;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditWarning, GameLevel, GameWageLine, MemberWageInput, MemberWageResult, Period,
};

use super::plan_mode::PlanMode;
use super::tenure::resolve_tenure;

/// The priced member together with the audit output produced while pricing.
#[derive(Debug, Clone)]
pub struct MemberPricing {
    /// The member's wage result.
    pub result: MemberWageResult,
    /// Input quality warnings (unresolved games, negative tenure).
    pub warnings: Vec<AuditWarning>,
    /// Audit steps in the order they were taken.
    pub audit_steps: Vec<AuditStep>,
}

/// Where a session's unit rate comes from.
enum UnitRate<'a> {
    Flat(i64),
    Tier(&'a RateTier),
}

impl UnitRate<'_> {
    fn for_level(&self, level: GameLevel) -> i64 {
        match self {
            UnitRate::Flat(rate) => *rate,
            UnitRate::Tier(tier) => tier.rate(level),
        }
    }

    fn tier_name(&self) -> Option<String> {
        match self {
            UnitRate::Flat(_) => None,
            UnitRate::Tier(tier) => Some(tier.name.clone()),
        }
    }
}

fn wage_overflow(user_id: &str) -> EngineError {
    EngineError::AmountOverflow {
        context: format!("wage for member '{}'", user_id),
    }
}

/// Prices a member's sessions under the facility's plan mode.
///
/// Classified sessions are grouped by `(game_name, level)` in the order each
/// pair first appears. Unclassified sessions earn nothing; they are counted in
/// `unresolved_session_count` and reported as `UNRESOLVED_GAME` warnings.
///
/// Audit steps are numbered from `step_number`; the tiered plan records a
/// tenure step before the pricing step.
///
/// # Errors
///
/// Returns `NoTierConfigured` when the tiered plan has no tier for the
/// member's tenure, and `AmountOverflow` when the wage does not fit in an
/// `i64`.
///
/// # Examples
///
/// ```
/// use wage_engine::calculation::{PlanMode, price_member};
/// use wage_engine::models::{
///     GameLevel, MemberProfile, MemberWageInput, Period, PlaySessionRecord,
/// };
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
/// let sessions = (0..10)
///     .map(|_| PlaySessionRecord {
///         date,
///         game_name: "Memory Match".to_string(),
///         game_level: GameLevel::new(1),
///     })
///     .collect();
/// let input = MemberWageInput {
///     profile: MemberProfile::facility_payee("fac-1", "Sunrise Center"),
///     sessions,
/// };
///
/// let pricing = price_member(
///     &input,
///     &PlanMode::Flat { rate: 80 },
///     Period::new(2025, 4).unwrap(),
///     1,
/// )
/// .unwrap();
/// assert_eq!(pricing.result.total_wage, 800);
/// assert_eq!(pricing.result.valid_play_count, 10);
/// ```
pub fn price_member(
    input: &MemberWageInput,
    mode: &PlanMode<'_>,
    period: Period,
    step_number: u32,
) -> EngineResult<MemberPricing> {
    let profile = &input.profile;
    let mut warnings = Vec::new();
    let mut audit_steps = Vec::new();

    let (unit_rate, continuation_months) = match *mode {
        PlanMode::Flat { rate } => (UnitRate::Flat(rate), None),
        PlanMode::Tiered { tiers } => {
            let resolution = resolve_tenure(profile, period, tiers, step_number)?;
            warnings.extend(resolution.warning);
            audit_steps.push(resolution.audit_step);
            (UnitRate::Tier(resolution.tier), Some(resolution.months))
        }
    };

    let mut breakdown: Vec<GameWageLine> = Vec::new();
    let mut line_index: HashMap<(String, GameLevel), usize> = HashMap::new();
    let mut unresolved: Vec<(String, u32)> = Vec::new();

    for session in &input.sessions {
        let Some(level) = session.game_level else {
            match unresolved.iter_mut().find(|(name, _)| *name == session.game_name) {
                Some((_, count)) => *count += 1,
                None => unresolved.push((session.game_name.clone(), 1)),
            }
            continue;
        };

        let key = (session.game_name.clone(), level);
        let index = *line_index.entry(key).or_insert_with(|| {
            let unit_rate = unit_rate.for_level(level);
            breakdown.push(GameWageLine {
                game_name: session.game_name.clone(),
                game_level: level,
                play_count: 0,
                unit_rate,
                amount: 0,
            });
            breakdown.len() - 1
        });

        let line = &mut breakdown[index];
        line.play_count += 1;
        line.amount = line
            .amount
            .checked_add(line.unit_rate)
            .ok_or_else(|| wage_overflow(&profile.user_id))?;
    }

    for (name, count) in &unresolved {
        warnings.push(AuditWarning::new(
            "UNRESOLVED_GAME",
            format!(
                "Member '{}' has {} session(s) of '{}' that match no catalog game; not paid",
                profile.user_id, count, name
            ),
            "medium",
        ));
    }

    let valid_play_count: u32 = breakdown.iter().map(|l| l.play_count).sum();
    let total_wage = breakdown
        .iter()
        .try_fold(0i64, |total, line| total.checked_add(line.amount))
        .ok_or_else(|| wage_overflow(&profile.user_id))?;
    let unresolved_session_count: u32 = unresolved.iter().map(|(_, count)| count).sum();

    let result = MemberWageResult {
        user_id: profile.user_id.clone(),
        user_name: profile.user_name.clone(),
        tier_name: unit_rate.tier_name(),
        continuation_months,
        valid_play_count,
        total_wage,
        raw_session_count: valid_play_count + unresolved_session_count,
        unresolved_session_count,
        breakdown,
    };

    audit_steps.push(AuditStep {
        step_number: step_number + audit_steps.len() as u32,
        rule_id: "member_pricing".to_string(),
        rule_name: "Member Pricing".to_string(),
        input: serde_json::json!({
            "user_id": result.user_id,
            "plan_type": mode.plan_type().as_str(),
            "tier": result.tier_name,
            "session_count": input.sessions.len()
        }),
        output: serde_json::json!({
            "valid_play_count": result.valid_play_count,
            "unresolved_session_count": result.unresolved_session_count,
            "total_wage": result.total_wage,
            "lines": result.breakdown.len()
        }),
        reasoning: format!(
            "{} paid session(s) across {} game line(s) total {}",
            result.valid_play_count,
            result.breakdown.len(),
            result.total_wage
        ),
    });

    Ok(MemberPricing {
        result,
        warnings,
        audit_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelRates;
    use crate::error::EngineError;
    use crate::models::{MemberProfile, PlaySessionRecord, Tenure};
    use chrono::NaiveDate;

    fn reference_tiers() -> Vec<RateTier> {
        let tier = |name: &str, min: u32, max: Option<u32>, base: i64| RateTier {
            name: name.to_string(),
            min_months: min,
            max_months: max,
            rates: LevelRates {
                level_1: base,
                level_2: base + 10,
                level_3: base + 20,
                level_4: base + 30,
            },
        };
        vec![
            tier("0-3 months", 0, Some(3), 50),
            tier("4-9 months", 4, Some(9), 60),
            tier("9+ months", 9, None, 70),
        ]
    }

    fn session(name: &str, level: Option<u8>) -> PlaySessionRecord {
        PlaySessionRecord {
            date: NaiveDate::from_ymd_opt(2025, 4, 3).unwrap(),
            game_name: name.to_string(),
            game_level: level.and_then(GameLevel::new),
        }
    }

    fn member(tenure: Tenure, sessions: Vec<PlaySessionRecord>) -> MemberWageInput {
        MemberWageInput {
            profile: MemberProfile {
                user_id: "u1".to_string(),
                user_name: "Aiko".to_string(),
                tenure,
            },
            sessions,
        }
    }

    fn april() -> Period {
        Period::new(2025, 4).unwrap()
    }

    /// MW-001: three L2 and two L3 sessions at five months of tenure
    #[test]
    fn test_tiered_mid_tier_scenario() {
        let tiers = reference_tiers();
        let input = member(
            Tenure::StartDate(NaiveDate::from_ymd_opt(2024, 11, 20).unwrap()),
            vec![
                session("Puzzle Garden", Some(2)),
                session("Number Bridge", Some(3)),
                session("Puzzle Garden", Some(2)),
                session("Puzzle Garden", Some(2)),
                session("Number Bridge", Some(3)),
            ],
        );

        let pricing = price_member(&input, &PlanMode::Tiered { tiers: &tiers }, april(), 1).unwrap();
        let result = pricing.result;

        assert_eq!(result.total_wage, 3 * 70 + 2 * 80);
        assert_eq!(result.total_wage, 370);
        assert_eq!(result.valid_play_count, 5);
        assert_eq!(result.tier_name.as_deref(), Some("4-9 months"));
        assert_eq!(result.continuation_months, Some(5));
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown[0].game_name, "Puzzle Garden");
        assert_eq!(result.breakdown[0].play_count, 3);
        assert_eq!(result.breakdown[0].amount, 210);
        assert_eq!(result.breakdown[1].unit_rate, 80);
        assert!(result.is_consistent());
    }

    /// MW-002: flat plan ignores level and tenure
    #[test]
    fn test_flat_plan_prices_every_level_the_same() {
        let input = member(
            Tenure::ContinuationMonths(40),
            vec![
                session("Memory Match", Some(1)),
                session("Strategy Tower", Some(4)),
            ],
        );
        let pricing = price_member(&input, &PlanMode::Flat { rate: 80 }, april(), 1).unwrap();

        assert_eq!(pricing.result.total_wage, 160);
        assert!(pricing.result.breakdown.iter().all(|l| l.unit_rate == 80));
        assert_eq!(pricing.result.tier_name, None);
        assert_eq!(pricing.audit_steps.len(), 1);
        assert_eq!(pricing.audit_steps[0].rule_id, "member_pricing");
    }

    /// MW-003: unresolved sessions are counted but unpaid
    #[test]
    fn test_unresolved_sessions_are_reported_not_paid() {
        let tiers = reference_tiers();
        let input = member(
            Tenure::ContinuationMonths(1),
            vec![
                session("Memory Match", Some(1)),
                session("Mystery Quest", None),
                session("Mystery Quest", None),
                session("Kite Race", None),
            ],
        );
        let pricing = price_member(&input, &PlanMode::Tiered { tiers: &tiers }, april(), 1).unwrap();

        assert_eq!(pricing.result.total_wage, 50);
        assert_eq!(pricing.result.valid_play_count, 1);
        assert_eq!(pricing.result.raw_session_count, 4);
        assert_eq!(pricing.result.unresolved_session_count, 3);
        let codes: Vec<&str> = pricing.warnings.iter().map(|w| w.code.as_str()).collect();
        assert_eq!(codes, vec!["UNRESOLVED_GAME", "UNRESOLVED_GAME"]);
        assert!(pricing.warnings[0].message.contains("2 session(s) of 'Mystery Quest'"));
    }

    /// MW-004: same name at different levels stays on separate lines
    #[test]
    fn test_breakdown_keyed_by_name_and_level() {
        let tiers = reference_tiers();
        let input = member(
            Tenure::ContinuationMonths(0),
            vec![
                session("Card Sort", Some(1)),
                session("Card Sort", Some(2)),
                session("Card Sort", Some(1)),
            ],
        );
        let pricing = price_member(&input, &PlanMode::Tiered { tiers: &tiers }, april(), 1).unwrap();
        let lines = &pricing.result.breakdown;

        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].game_level.get(), lines[0].play_count), (1, 2));
        assert_eq!((lines[1].game_level.get(), lines[1].play_count), (2, 1));
        assert_eq!(pricing.result.total_wage, 50 * 2 + 60);
    }

    #[test]
    fn test_no_sessions_prices_to_zero() {
        let tiers = reference_tiers();
        let input = member(Tenure::ContinuationMonths(3), vec![]);
        let pricing = price_member(&input, &PlanMode::Tiered { tiers: &tiers }, april(), 4).unwrap();

        assert_eq!(pricing.result.total_wage, 0);
        assert!(pricing.result.breakdown.is_empty());
        let steps: Vec<u32> = pricing.audit_steps.iter().map(|s| s.step_number).collect();
        assert_eq!(steps, vec![4, 5]);
    }

    #[test]
    fn test_negative_tenure_warning_is_forwarded() {
        let tiers = reference_tiers();
        let input = member(Tenure::ContinuationMonths(-1), vec![session("Memory Match", Some(1))]);
        let pricing = price_member(&input, &PlanMode::Tiered { tiers: &tiers }, april(), 1).unwrap();

        assert_eq!(pricing.result.continuation_months, Some(0));
        assert_eq!(pricing.warnings[0].code, "NEGATIVE_TENURE");
    }

    #[test]
    fn test_uncovered_tenure_is_fatal() {
        let tiers = vec![reference_tiers().remove(0)];
        let input = member(Tenure::ContinuationMonths(12), vec![]);
        assert!(matches!(
            price_member(&input, &PlanMode::Tiered { tiers: &tiers }, april(), 1),
            Err(EngineError::NoTierConfigured { months: 12 })
        ));
    }

    #[test]
    fn test_overflowing_wage_is_an_error() {
        let input = member(
            Tenure::ContinuationMonths(0),
            vec![
                session("Memory Match", Some(1)),
                session("Memory Match", Some(1)),
            ],
        );
        match price_member(&input, &PlanMode::Flat { rate: i64::MAX }, april(), 1) {
            Err(EngineError::AmountOverflow { context }) => assert!(context.contains("'u1'")),
            other => panic!("Expected AmountOverflow, got {:?}", other),
        }
    }
}
