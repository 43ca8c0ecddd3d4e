//! Carryover settlement functionality.
//!
//! Balances below the minimum payment are deferred to the next month instead
//! of being paid out. Once the combined balance reaches the minimum, the whole
//! balance is paid and the carryover resets to zero.

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, CarryoverState};

/// The settled state and its audit step.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    /// The settled carryover state.
    pub state: CarryoverState,
    /// The audit step recording the settlement.
    pub audit_step: AuditStep,
}

/// Settles one month against the minimum payment threshold.
///
/// # Examples
///
/// ```
/// use wage_engine::calculation::settle;
///
/// let paid = settle(700, 400, 1000).unwrap();
/// assert_eq!(paid.payment_amount, 1100);
/// assert_eq!(paid.next_carryover, 0);
///
/// let deferred = settle(300, 200, 1000).unwrap();
/// assert_eq!(deferred.payment_amount, 0);
/// assert_eq!(deferred.next_carryover, 500);
/// ```
///
/// # Errors
///
/// Returns `AmountOverflow` if the combined balance does not fit in an `i64`.
pub fn settle(
    current_month_wage: i64,
    previous_carryover: i64,
    minimum_payment: i64,
) -> EngineResult<CarryoverState> {
    let combined = current_month_wage
        .checked_add(previous_carryover)
        .ok_or_else(|| EngineError::AmountOverflow {
            context: "carryover balance".to_string(),
        })?;
    let (payment_amount, next_carryover) = if combined < minimum_payment {
        (0, combined)
    } else {
        (combined, 0)
    };

    Ok(CarryoverState {
        previous_carryover,
        current_month_wage,
        payment_amount,
        next_carryover,
    })
}

/// Settles a month and records an audit step for it.
pub fn settle_month(
    current_month_wage: i64,
    previous_carryover: i64,
    minimum_payment: i64,
    step_number: u32,
) -> EngineResult<SettlementResult> {
    let state = settle(current_month_wage, previous_carryover, minimum_payment)?;
    // One side is always zero after settlement.
    let combined = state.payment_amount + state.next_carryover;

    let reasoning = if state.is_deferred() {
        format!(
            "Combined balance {} is below the minimum payment {}; deferred to next month",
            combined,
            minimum_payment
        )
    } else {
        format!(
            "Combined balance {} meets the minimum payment {}; paid in full",
            combined,
            minimum_payment
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "carryover_settlement".to_string(),
        rule_name: "Carryover Settlement".to_string(),
        input: serde_json::json!({
            "previous_carryover": previous_carryover,
            "current_month_wage": current_month_wage,
            "minimum_payment": minimum_payment
        }),
        output: serde_json::json!({
            "payment_amount": state.payment_amount,
            "next_carryover": state.next_carryover
        }),
        reasoning,
    };

    Ok(SettlementResult { state, audit_step })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// CO-001: carryover plus current wage reaches the threshold
    #[test]
    fn test_carryover_released_when_threshold_reached() {
        let state = settle(700, 400, 1000).unwrap();
        assert_eq!(state.payment_amount, 1100);
        assert_eq!(state.next_carryover, 0);
        assert!(state.is_balanced());
    }

    /// CO-002: combined balance below threshold is deferred
    #[test]
    fn test_below_threshold_is_deferred() {
        let state = settle(300, 200, 1000).unwrap();
        assert_eq!(state.payment_amount, 0);
        assert_eq!(state.next_carryover, 500);
        assert!(state.is_deferred());
    }

    #[test]
    fn test_exactly_at_threshold_is_paid() {
        let state = settle(1000, 0, 1000).unwrap();
        assert_eq!(state.payment_amount, 1000);
        assert_eq!(state.next_carryover, 0);
    }

    #[test]
    fn test_one_below_threshold_is_deferred() {
        let state = settle(999, 0, 1000).unwrap();
        assert_eq!(state.payment_amount, 0);
        assert_eq!(state.next_carryover, 999);
    }

    #[test]
    fn test_zero_month_keeps_carryover() {
        let state = settle(0, 650, 1000).unwrap();
        assert_eq!(state.next_carryover, 650);
        assert_eq!(state.previous_carryover, 650);
    }

    #[test]
    fn test_settlement_is_idempotent() {
        assert_eq!(settle(420, 380, 1000).unwrap(), settle(420, 380, 1000).unwrap());
    }

    #[test]
    fn test_multi_month_chain() {
        let march = settle(300, 0, 1000).unwrap();
        let april = settle(300, march.next_carryover, 1000).unwrap();
        let may = settle(500, april.next_carryover, 1000).unwrap();

        assert_eq!(march.next_carryover, 300);
        assert_eq!(april.next_carryover, 600);
        assert_eq!(may.payment_amount, 1100);
        assert_eq!(may.next_carryover, 0);
    }

    #[test]
    fn test_overflowing_balance_is_an_error() {
        assert!(matches!(
            settle(1, i64::MAX, 1000),
            Err(EngineError::AmountOverflow { .. })
        ));
        assert!(settle_month(i64::MAX, i64::MAX, 1000, 1).is_err());
    }

    #[test]
    fn test_largest_balance_still_settles() {
        let state = settle(0, i64::MAX, 1000).unwrap();
        assert_eq!(state.payment_amount, i64::MAX);
        assert!(state.is_balanced());
    }

    #[test]
    fn test_settle_month_audit_step() {
        let result = settle_month(300, 200, 1000, 6).unwrap();
        assert_eq!(result.audit_step.step_number, 6);
        assert_eq!(result.audit_step.rule_id, "carryover_settlement");
        assert_eq!(result.audit_step.output["next_carryover"], 500);
        assert!(result.audit_step.reasoning.contains("deferred"));
    }
}
