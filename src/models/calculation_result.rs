//! Calculation result models for the Facility Wage Engine.
//!
//! This module contains the [`WageRun`] produced by the calculation pipeline,
//! the [`WageCalculation`] envelope returned by the API, and the audit trace
//! types that record every decision made along the way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CarryoverState, FacilityWageResult};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings mark input-quality problems that do not stop the run, such as a
/// game name that matched no catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

impl AuditWarning {
    /// Creates a warning.
    pub fn new(code: &str, message: impl Into<String>, severity: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: severity.to_string(),
        }
    }
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use wage_engine::models::AuditTrace;
///
/// let trace = AuditTrace {
///     steps: vec![],
///     warnings: vec![],
///     duration_us: 1234,
/// };
/// assert!(trace.steps.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

/// The output of one pipeline run for a facility month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageRun {
    /// The aggregated facility result.
    pub facility: FacilityWageResult,
    /// The carryover settlement for the month.
    pub carryover: CarryoverState,
    /// Every decision made during the run.
    pub audit_trace: AuditTrace,
}

/// A [`WageRun`] as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageCalculation {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The aggregated facility result.
    pub facility: FacilityWageResult,
    /// The carryover settlement for the month.
    pub carryover: CarryoverState,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl From<WageRun> for WageCalculation {
    fn from(run: WageRun) -> Self {
        WageCalculation {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            facility: run.facility,
            carryover: run.carryover,
            audit_trace: run.audit_trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanType;
    use rust_decimal::Decimal;

    fn sample_run() -> WageRun {
        WageRun {
            facility: FacilityWageResult {
                facility_id: "fac-1".to_string(),
                year: 2025,
                month: 4,
                plan_type: PlanType::Tiered,
                members: vec![],
                total_amount: 0,
                member_count: 0,
                total_play_count: 0,
                average_wage_per_member: Decimal::ZERO,
                skipped_members: vec![],
            },
            carryover: CarryoverState {
                previous_carryover: 0,
                current_month_wage: 0,
                payment_amount: 0,
                next_carryover: 0,
            },
            audit_trace: AuditTrace {
                steps: vec![],
                warnings: vec![AuditWarning::new("UNRESOLVED_GAME", "x", "medium")],
                duration_us: 10,
            },
        }
    }

    #[test]
    fn test_wage_calculation_envelope_keeps_run_figures() {
        let run = sample_run();
        let calculation: WageCalculation = run.clone().into();
        assert_eq!(calculation.facility, run.facility);
        assert_eq!(calculation.carryover, run.carryover);
        assert_eq!(calculation.engine_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(calculation.audit_trace.warnings.len(), 1);
    }

    #[test]
    fn test_each_envelope_gets_a_fresh_id() {
        let first: WageCalculation = sample_run().into();
        let second: WageCalculation = sample_run().into();
        assert_ne!(first.calculation_id, second.calculation_id);
    }

    #[test]
    fn test_audit_step_serialization() {
        let step = AuditStep {
            step_number: 1,
            rule_id: "tenure_resolution".to_string(),
            rule_name: "Tenure Resolution".to_string(),
            input: serde_json::json!({"continuation_months": 5}),
            output: serde_json::json!({"tier": "4-9 months"}),
            reasoning: "5 months falls in '4-9 months'".to_string(),
        };
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"rule_id\":\"tenure_resolution\""));
        let back: AuditStep = serde_json::from_str(&json).unwrap();
        assert_eq!(back, step);
    }
}
