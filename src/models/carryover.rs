//! Carryover models.
//!
//! A [`CarryoverState`] is the settlement of one facility month; a
//! [`CarryoverRecord`] is that settlement as persisted, with its workflow status.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Period;

/// The outcome of settling one facility month against the minimum payment.
///
/// `previous_carryover + current_month_wage == payment_amount + next_carryover`
/// always holds for states produced by the settlement function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverState {
    /// Balance brought in from the previous month.
    pub previous_carryover: i64,
    /// This month's computed facility total.
    pub current_month_wage: i64,
    /// Amount disbursed this month.
    pub payment_amount: i64,
    /// Amount deferred to the following month.
    pub next_carryover: i64,
}

impl CarryoverState {
    /// Previous carryover plus this month's wage, or `None` on overflow.
    pub fn combined(&self) -> Option<i64> {
        self.previous_carryover.checked_add(self.current_month_wage)
    }

    /// Returns true if no amount was created or lost.
    pub fn is_balanced(&self) -> bool {
        let settled = self.payment_amount.checked_add(self.next_carryover);
        self.combined().is_some() && self.combined() == settled
    }

    /// Returns true if nothing is paid out this month.
    pub fn is_deferred(&self) -> bool {
        self.payment_amount == 0
    }
}

/// Workflow status of a persisted carryover record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthStatus {
    /// Calculated but still open to recalculation.
    Draft,
    /// Approved; figures are frozen.
    Confirmed,
    /// Disbursed.
    Paid,
}

impl MonthStatus {
    /// Returns true once the month can no longer be recalculated.
    pub fn is_finalized(&self) -> bool {
        !matches!(self, MonthStatus::Draft)
    }

    /// Only single forward steps are allowed: draft → confirmed → paid.
    pub fn can_transition_to(&self, next: MonthStatus) -> bool {
        matches!(
            (self, next),
            (MonthStatus::Draft, MonthStatus::Confirmed) | (MonthStatus::Confirmed, MonthStatus::Paid)
        )
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MonthStatus::Draft => "draft",
            MonthStatus::Confirmed => "confirmed",
            MonthStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for MonthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted carryover row for one facility month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverRecord {
    /// The facility.
    pub facility_id: String,
    /// The settled month.
    pub period: Period,
    /// The settlement figures.
    pub state: CarryoverState,
    /// The minimum payment threshold the month was settled against.
    pub minimum_payment: i64,
    /// Workflow status.
    pub status: MonthStatus,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_state() {
        let state = CarryoverState {
            previous_carryover: 300,
            current_month_wage: 200,
            payment_amount: 0,
            next_carryover: 500,
        };
        assert_eq!(state.combined(), Some(500));
        assert!(state.is_balanced());
        assert!(state.is_deferred());
    }

    #[test]
    fn test_combined_overflow_is_none() {
        let state = CarryoverState {
            previous_carryover: i64::MAX,
            current_month_wage: 1,
            payment_amount: 0,
            next_carryover: 0,
        };
        assert_eq!(state.combined(), None);
        assert!(!state.is_balanced());
    }

    #[test]
    fn test_unbalanced_state_is_detected() {
        let state = CarryoverState {
            previous_carryover: 300,
            current_month_wage: 200,
            payment_amount: 500,
            next_carryover: 500,
        };
        assert!(!state.is_balanced());
    }

    #[test]
    fn test_status_transitions_are_forward_only() {
        assert!(MonthStatus::Draft.can_transition_to(MonthStatus::Confirmed));
        assert!(MonthStatus::Confirmed.can_transition_to(MonthStatus::Paid));
        assert!(!MonthStatus::Draft.can_transition_to(MonthStatus::Paid));
        assert!(!MonthStatus::Paid.can_transition_to(MonthStatus::Draft));
        assert!(!MonthStatus::Confirmed.can_transition_to(MonthStatus::Confirmed));
    }

    #[test]
    fn test_finalized_statuses() {
        assert!(!MonthStatus::Draft.is_finalized());
        assert!(MonthStatus::Confirmed.is_finalized());
        assert!(MonthStatus::Paid.is_finalized());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&MonthStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        assert_eq!(MonthStatus::Paid.to_string(), "paid");
    }
}
