//! Wage result models.
//!
//! This module contains the per-member and per-facility results produced by
//! the wage calculator and the facility aggregator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{GameLevel, PlanType};

/// One priced line of a member's breakdown: all sessions of one game at one level.
///
/// # Example
///
/// ```
/// use wage_engine::models::{GameLevel, GameWageLine};
///
/// let line = GameWageLine {
///     game_name: "Puzzle Garden".to_string(),
///     game_level: GameLevel::new(2).unwrap(),
///     play_count: 3,
///     unit_rate: 70,
///     amount: 210,
/// };
/// assert_eq!(line.amount, i64::from(line.play_count) * line.unit_rate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameWageLine {
    /// Canonical game name.
    pub game_name: String,
    /// The difficulty level the sessions were priced at.
    pub game_level: GameLevel,
    /// Number of sessions on this line.
    pub play_count: u32,
    /// Rate per session in currency units.
    pub unit_rate: i64,
    /// `play_count * unit_rate`.
    pub amount: i64,
}

/// The priced result for one payee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberWageResult {
    /// Unique identifier of the member (the facility id for entry plans).
    pub user_id: String,
    /// Display name of the member.
    pub user_name: String,
    /// Name of the rate tier applied; `None` for entry plans.
    pub tier_name: Option<String>,
    /// Tenure used for tier resolution; `None` for entry plans.
    pub continuation_months: Option<u32>,
    /// Sessions that counted toward pay.
    pub valid_play_count: u32,
    /// Total payable amount in currency units.
    pub total_wage: i64,
    /// All sessions left after exclusion filtering, classified or not.
    pub raw_session_count: u32,
    /// Sessions whose game name matched no catalog entry.
    pub unresolved_session_count: u32,
    /// Per-game line items.
    pub breakdown: Vec<GameWageLine>,
}

impl MemberWageResult {
    /// Returns true if the totals agree with the breakdown.
    pub fn is_consistent(&self) -> bool {
        let amount: i64 = self.breakdown.iter().map(|l| l.amount).sum();
        let plays: u32 = self.breakdown.iter().map(|l| l.play_count).sum();
        amount == self.total_wage && plays == self.valid_play_count
    }
}

/// A payee left out of the aggregate because its log could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMember {
    /// Unique identifier of the member.
    pub user_id: String,
    /// Display name of the member.
    pub user_name: String,
    /// Why the member was skipped.
    pub reason: String,
}

/// The aggregated result for one facility month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityWageResult {
    /// The facility.
    pub facility_id: String,
    /// Target year.
    pub year: i32,
    /// Target month.
    pub month: u32,
    /// The plan the facility was priced under.
    pub plan_type: PlanType,
    /// Member results in caller-provided order.
    pub members: Vec<MemberWageResult>,
    /// Sum of member totals.
    pub total_amount: i64,
    /// Number of priced members.
    pub member_count: u32,
    /// Sum of member valid play counts.
    pub total_play_count: u32,
    /// `total_amount / member_count`, rounded to 2 decimal places; 0 without members.
    pub average_wage_per_member: Decimal,
    /// Payees that are missing from `members`.
    #[serde(default)]
    pub skipped_members: Vec<SkippedMember>,
}

impl FacilityWageResult {
    /// Returns true if no payee was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped_members.is_empty()
    }

    /// Members ordered by descending total wage, ties kept in input order.
    pub fn members_by_amount_desc(&self) -> Vec<&MemberWageResult> {
        let mut members: Vec<&MemberWageResult> = self.members.iter().collect();
        members.sort_by(|a, b| b.total_wage.cmp(&a.total_wage));
        members
    }
}
