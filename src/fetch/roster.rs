//! Concurrent roster fetch.
//!
//! Fetches every payee's log for a month before any pricing starts. Member
//! fetches run on a bounded pool and results come back in roster order.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    FacilityMonthInput, FacilityRoster, MemberProfile, MemberSessionLog, Period, PlanType,
    SkippedMember,
};

use super::retry::{RetryFailure, RetryPolicy, retry_with_backoff};
use super::source::{SessionLogSource, SourceError};

/// Default number of member logs fetched at once.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// A payee whose log could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// The payee that was being fetched.
    pub profile: MemberProfile,
    /// Attempts made.
    pub attempts: u32,
    /// The last error.
    pub error: SourceError,
}

impl FetchFailure {
    /// The failure as an engine error naming the payee.
    pub fn to_error(&self) -> EngineError {
        EngineError::SessionFetchFailed {
            user_id: self.profile.user_id.clone(),
            attempts: self.attempts,
            message: self.error.to_string(),
        }
    }

    /// The failure as a skipped-member entry for a partial result.
    pub fn to_skipped(&self) -> SkippedMember {
        SkippedMember {
            user_id: self.profile.user_id.clone(),
            user_name: self.profile.user_name.clone(),
            reason: format!(
                "session log unavailable after {} attempt(s): {}",
                self.attempts, self.error
            ),
        }
    }
}

/// The fetched month: the calculation input plus the payees that failed.
///
/// Failed payees are also listed in `input.skipped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterFetch {
    /// Input ready for the calculation pipeline.
    pub input: FacilityMonthInput,
    /// Payees whose logs could not be fetched.
    pub failures: Vec<FetchFailure>,
}

impl RosterFetch {
    /// Returns true if every payee's log was fetched.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetches the session logs for every payee on a facility roster.
///
/// Tiered facilities fetch each member's log, at most `concurrency` at a
/// time; entry-plan facilities fetch the single facility log. Each fetch is
/// retried per `policy`.
///
/// # Errors
///
/// Returns `InvalidFacilityInput` when an entry-plan roster lists members.
pub async fn fetch_month(
    source: &dyn SessionLogSource,
    roster: &FacilityRoster,
    period: Period,
    policy: &RetryPolicy,
    concurrency: usize,
) -> EngineResult<RosterFetch> {
    let outcomes = match roster.plan_type {
        PlanType::Entry => {
            if !roster.members.is_empty() {
                return Err(EngineError::InvalidFacilityInput {
                    facility_id: roster.facility_id.clone(),
                    message: format!(
                        "entry-plan facilities are paid as a single payee, but {} member(s) were listed",
                        roster.members.len()
                    ),
                });
            }
            let payee = MemberProfile::facility_payee(&roster.facility_id, &roster.facility_name);
            let result = retry_with_backoff("fetch_facility_sessions", policy, || {
                source.fetch_facility_sessions(&roster.facility_id, period)
            })
            .await;
            vec![(payee, result)]
        }
        PlanType::Tiered => {
            stream::iter(roster.members.iter().cloned())
                .map(|profile| async move {
                    let result = retry_with_backoff("fetch_member_sessions", policy, || {
                        source.fetch_member_sessions(&profile.user_id, period)
                    })
                    .await;
                    (profile, result)
                })
                .buffered(concurrency.max(1))
                .collect::<Vec<_>>()
                .await
        }
    };

    let mut logs = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (profile, result) in outcomes {
        match result {
            Ok(rows) => logs.push(MemberSessionLog { profile, rows }),
            Err(RetryFailure { attempts, error }) => {
                warn!(
                    facility_id = %roster.facility_id,
                    user_id = %profile.user_id,
                    attempts,
                    error = %error,
                    "Session log unavailable"
                );
                failures.push(FetchFailure {
                    profile,
                    attempts,
                    error,
                });
            }
        }
    }

    info!(
        facility_id = %roster.facility_id,
        period = %period,
        fetched = logs.len(),
        failed = failures.len(),
        "Roster fetch finished"
    );

    Ok(RosterFetch {
        input: FacilityMonthInput {
            facility_id: roster.facility_id.clone(),
            period,
            plan_type: roster.plan_type,
            logs,
            skipped: failures.iter().map(FetchFailure::to_skipped).collect(),
        },
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::InMemorySessionSource;
    use crate::models::{RawSessionRow, Tenure};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn april() -> Period {
        Period::new(2025, 4).unwrap()
    }

    fn profile(user_id: &str) -> MemberProfile {
        MemberProfile {
            user_id: user_id.to_string(),
            user_name: user_id.to_uppercase(),
            tenure: Tenure::ContinuationMonths(2),
        }
    }

    fn tiered_roster(ids: &[&str]) -> FacilityRoster {
        FacilityRoster {
            facility_id: "fac-1".to_string(),
            facility_name: "Sunrise Center".to_string(),
            plan_type: PlanType::Tiered,
            members: ids.iter().map(|id| profile(id)).collect(),
        }
    }

    fn row(name: &str) -> RawSessionRow {
        RawSessionRow::new(NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(), name)
    }

    #[tokio::test]
    async fn test_logs_come_back_in_roster_order() {
        let source = InMemorySessionSource::new();
        source.insert("c", april(), vec![row("Word Chain")]);
        source.insert("a", april(), vec![row("Memory Match")]);

        let fetched = fetch_month(
            &source,
            &tiered_roster(&["c", "b", "a"]),
            april(),
            &RetryPolicy::immediate(1),
            2,
        )
        .await
        .unwrap();

        assert!(fetched.is_complete());
        let ids: Vec<&str> = fetched
            .input
            .logs
            .iter()
            .map(|log| log.profile.user_id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(fetched.input.logs[1].rows.len(), 0);
        assert_eq!(fetched.input.logs[2].rows[0].game_name, "Memory Match");
    }

    #[tokio::test]
    async fn test_failures_are_reported_per_member() {
        let source = InMemorySessionSource::new();
        source.fail_with("b", SourceError::Permanent("unknown member".to_string()));

        let fetched = fetch_month(
            &source,
            &tiered_roster(&["a", "b"]),
            april(),
            &RetryPolicy::immediate(3),
            4,
        )
        .await
        .unwrap();

        assert!(!fetched.is_complete());
        assert_eq!(fetched.input.logs.len(), 1);
        assert_eq!(fetched.failures[0].profile.user_id, "b");
        assert_eq!(fetched.failures[0].attempts, 1);
        assert_eq!(fetched.input.skipped[0].user_id, "b");
        assert!(matches!(
            fetched.failures[0].to_error(),
            EngineError::SessionFetchFailed { ref user_id, attempts: 1, .. } if user_id == "b"
        ));
    }

    #[tokio::test]
    async fn test_entry_plan_fetches_facility_log() {
        let source = InMemorySessionSource::new();
        source.insert("fac-2", april(), vec![row("Memory Match"), row("Color Sort")]);
        let roster = FacilityRoster {
            facility_id: "fac-2".to_string(),
            facility_name: "Harbor House".to_string(),
            plan_type: PlanType::Entry,
            members: vec![],
        };

        let fetched = fetch_month(&source, &roster, april(), &RetryPolicy::immediate(1), 4)
            .await
            .unwrap();

        assert_eq!(fetched.input.logs.len(), 1);
        assert_eq!(fetched.input.logs[0].profile.user_name, "Harbor House");
        assert_eq!(fetched.input.logs[0].rows.len(), 2);
    }

    #[tokio::test]
    async fn test_entry_plan_with_members_is_rejected() {
        let source = InMemorySessionSource::new();
        let roster = FacilityRoster {
            plan_type: PlanType::Entry,
            ..tiered_roster(&["a"])
        };
        assert!(matches!(
            fetch_month(&source, &roster, april(), &RetryPolicy::immediate(1), 4).await,
            Err(EngineError::InvalidFacilityInput { .. })
        ));
    }

    struct CountingSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SessionLogSource for CountingSource {
        async fn fetch_member_sessions(
            &self,
            _user_id: &str,
            _period: Period,
        ) -> Result<Vec<RawSessionRow>, SourceError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn fetch_facility_sessions(
            &self,
            _facility_id: &str,
            _period: Period,
        ) -> Result<Vec<RawSessionRow>, SourceError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let source = CountingSource {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let roster = tiered_roster(&["a", "b", "c", "d", "e", "f", "g"]);

        let fetched = fetch_month(&source, &roster, april(), &RetryPolicy::immediate(1), 3)
            .await
            .unwrap();

        assert_eq!(fetched.input.logs.len(), 7);
        assert!(source.peak.load(Ordering::SeqCst) <= 3);
    }
}
