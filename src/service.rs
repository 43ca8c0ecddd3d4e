//! The wage service: fetch, calculate and persist facility months.
//!
//! [`WageService`] ties the session source, the calculation pipeline and the
//! carryover store together. Previews never persist anything. Writes are
//! serialized per facility, so a month's read of the previous balance can not
//! interleave with a write to the month before it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::calculation::calculate_facility_month;
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::fetch::{DEFAULT_FETCH_CONCURRENCY, RetryPolicy, SessionLogSource, fetch_month};
use crate::ledger::CarryoverStore;
use crate::models::{
    CarryoverRecord, FacilityMonthInput, FacilityRoster, MonthStatus, Period, WageRun,
};

/// A committed month: the calculation and the draft record it produced.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// The calculation that was persisted.
    pub run: WageRun,
    /// The stored draft.
    pub record: CarryoverRecord,
}

/// Orchestrates previews, commits and status changes for facility months.
pub struct WageService {
    config: Arc<ConfigLoader>,
    source: Arc<dyn SessionLogSource>,
    store: Arc<dyn CarryoverStore>,
    retry: RetryPolicy,
    concurrency: usize,
    facility_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WageService {
    /// Creates a service with the default retry policy and fetch concurrency.
    pub fn new(
        config: Arc<ConfigLoader>,
        source: Arc<dyn SessionLogSource>,
        store: Arc<dyn CarryoverStore>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            retry: RetryPolicy::default(),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
            facility_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the retry policy used for session fetches.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the number of member logs fetched at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Calculates an already-assembled month without touching the store.
    pub fn preview_input(
        &self,
        input: &FacilityMonthInput,
        previous_carryover: i64,
    ) -> EngineResult<WageRun> {
        calculate_facility_month(input, previous_carryover, &self.config)
    }

    /// Fetches and calculates a month without persisting it.
    ///
    /// Payees whose logs could not be fetched are left out and listed in
    /// `skipped_members`, with a `MEMBER_SKIPPED` warning each.
    pub async fn preview(&self, roster: &FacilityRoster, period: Period) -> EngineResult<WageRun> {
        let fetched = fetch_month(
            self.source.as_ref(),
            roster,
            period,
            &self.retry,
            self.concurrency,
        )
        .await?;
        if !fetched.is_complete() {
            warn!(
                facility_id = %roster.facility_id,
                period = %period,
                skipped = fetched.failures.len(),
                "Preview is missing members"
            );
        }

        let previous = self.store.previous_carryover(&roster.facility_id, period).await?;
        calculate_facility_month(&fetched.input, previous, &self.config)
    }

    /// Fetches, calculates and stores a month as a draft.
    ///
    /// # Errors
    ///
    /// - `MonthAlreadyFinalized` if the month is confirmed or paid
    /// - `LaterMonthExists` if a later month is already recorded
    /// - `SessionFetchFailed` naming the first payee whose log could not be
    ///   fetched; nothing is stored in that case
    /// - any configuration or input error from the calculation
    pub async fn commit(
        &self,
        roster: &FacilityRoster,
        period: Period,
    ) -> EngineResult<CommitOutcome> {
        self.serialized(&roster.facility_id, self.fetch_and_commit(roster, period))
            .await
    }

    async fn fetch_and_commit(
        &self,
        roster: &FacilityRoster,
        period: Period,
    ) -> EngineResult<CommitOutcome> {
        self.ensure_draftable(&roster.facility_id, period).await?;

        let fetched = fetch_month(
            self.source.as_ref(),
            roster,
            period,
            &self.retry,
            self.concurrency,
        )
        .await?;
        if let Some(failure) = fetched.failures.first() {
            return Err(failure.to_error());
        }

        self.commit_locked(&fetched.input).await
    }

    /// Calculates and stores an already-assembled month as a draft.
    ///
    /// Fails with `IncompleteRoster` if the input lists skipped members.
    pub async fn commit_input(&self, input: &FacilityMonthInput) -> EngineResult<CommitOutcome> {
        self.serialized(&input.facility_id, self.commit_locked(input))
            .await
    }

    async fn commit_locked(&self, input: &FacilityMonthInput) -> EngineResult<CommitOutcome> {
        if !input.skipped.is_empty() {
            return Err(EngineError::IncompleteRoster {
                facility_id: input.facility_id.clone(),
                skipped: input.skipped.len(),
            });
        }
        self.ensure_draftable(&input.facility_id, input.period).await?;

        let previous = self
            .store
            .previous_carryover(&input.facility_id, input.period)
            .await?;
        let minimum_payment = self.config.minimum_payment()?;
        let run = calculate_facility_month(input, previous, &self.config)?;
        let record = self
            .store
            .save_draft(&input.facility_id, input.period, run.carryover, minimum_payment)
            .await?;

        info!(
            facility_id = %input.facility_id,
            period = %input.period,
            total_amount = run.facility.total_amount,
            payment_amount = record.state.payment_amount,
            next_carryover = record.state.next_carryover,
            "Draft committed"
        );

        Ok(CommitOutcome { run, record })
    }

    /// Confirms a drafted month. Confirmed months can no longer be recalculated.
    pub async fn confirm(&self, facility_id: &str, period: Period) -> EngineResult<CarryoverRecord> {
        self.advance(facility_id, period, MonthStatus::Confirmed).await
    }

    /// Marks a confirmed month as paid.
    pub async fn mark_paid(&self, facility_id: &str, period: Period) -> EngineResult<CarryoverRecord> {
        self.advance(facility_id, period, MonthStatus::Paid).await
    }

    /// Returns the stored record for a facility-month.
    pub async fn carryover(&self, facility_id: &str, period: Period) -> EngineResult<CarryoverRecord> {
        self.store
            .get(facility_id, period)
            .await?
            .ok_or_else(|| EngineError::CarryoverNotFound {
                facility_id: facility_id.to_string(),
                year: period.year,
                month: period.month,
            })
    }

    async fn advance(
        &self,
        facility_id: &str,
        period: Period,
        status: MonthStatus,
    ) -> EngineResult<CarryoverRecord> {
        let record = self
            .serialized(facility_id, self.store.set_status(facility_id, period, status))
            .await?;
        info!(
            facility_id = %facility_id,
            period = %period,
            status = %record.status,
            "Carryover status changed"
        );
        Ok(record)
    }

    async fn ensure_draftable(&self, facility_id: &str, period: Period) -> EngineResult<()> {
        if let Some(record) = self.store.get(facility_id, period).await? {
            if record.status.is_finalized() {
                return Err(EngineError::MonthAlreadyFinalized {
                    facility_id: facility_id.to_string(),
                    year: period.year,
                    month: period.month,
                    status: record.status.to_string(),
                });
            }
        }
        if let Some(later) = self.store.latest_period(facility_id).await? {
            if later > period {
                return Err(EngineError::LaterMonthExists {
                    facility_id: facility_id.to_string(),
                    year: period.year,
                    month: period.month,
                    later_year: later.year,
                    later_month: later.month,
                });
            }
        }
        Ok(())
    }

    /// Runs `operation` while holding the facility's write lock.
    ///
    /// The lock entry is dropped from the map once no other caller holds it.
    async fn serialized<T>(&self, facility_id: &str, operation: impl Future<Output = T>) -> T {
        let lock = {
            let mut locks = self.facility_locks.lock().await;
            locks
                .entry(facility_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let result = {
            let _guard = lock.lock().await;
            operation.await
        };

        let mut locks = self.facility_locks.lock().await;
        // One count for the map, one for `lock`.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(facility_id);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{InMemorySessionSource, SourceError};
    use crate::ledger::InMemoryCarryoverStore;
    use crate::models::{MemberProfile, PlanType, RawSessionRow, Tenure};
    use chrono::NaiveDate;

    struct Fixture {
        service: Arc<WageService>,
        source: Arc<InMemorySessionSource>,
    }

    fn fixture() -> Fixture {
        let config = Arc::new(ConfigLoader::load("./config/standard").unwrap());
        let source = Arc::new(InMemorySessionSource::new());
        let store = Arc::new(InMemoryCarryoverStore::new());
        let service = WageService::new(config, source.clone(), store)
            .with_retry_policy(RetryPolicy::immediate(2));
        Fixture {
            service: Arc::new(service),
            source,
        }
    }

    fn roster() -> FacilityRoster {
        FacilityRoster {
            facility_id: "fac-1".to_string(),
            facility_name: "Sunrise Center".to_string(),
            plan_type: PlanType::Tiered,
            members: vec![MemberProfile {
                user_id: "u1".to_string(),
                user_name: "Aiko".to_string(),
                tenure: Tenure::ContinuationMonths(12),
            }],
        }
    }

    fn period(month: u32) -> Period {
        Period::new(2025, month).unwrap()
    }

    /// Stores `count` level-4 sessions, which pay 100 each in the 9+ tier.
    fn play(source: &InMemorySessionSource, month: u32, count: u32) {
        let rows = (1..=count)
            .map(|day| {
                RawSessionRow::new(NaiveDate::from_ymd_opt(2025, month, day).unwrap(), "Strategy Tower")
            })
            .collect();
        source.insert("u1", period(month), rows);
    }

    #[tokio::test]
    async fn test_commit_chains_carryover_across_months() {
        let f = fixture();
        play(&f.source, 3, 3);
        play(&f.source, 4, 4);
        play(&f.source, 5, 5);

        let march = f.service.commit(&roster(), period(3)).await.unwrap();
        assert_eq!(march.record.state.next_carryover, 300);

        let april = f.service.commit(&roster(), period(4)).await.unwrap();
        assert_eq!(april.record.state.previous_carryover, 300);
        assert_eq!(april.record.state.next_carryover, 700);

        let may = f.service.commit(&roster(), period(5)).await.unwrap();
        assert_eq!(may.record.state.payment_amount, 1200);
        assert_eq!(may.record.state.next_carryover, 0);
    }

    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let f = fixture();
        play(&f.source, 4, 2);

        let run = f.service.preview(&roster(), period(4)).await.unwrap();
        assert_eq!(run.facility.total_amount, 200);
        assert!(matches!(
            f.service.carryover("fac-1", period(4)).await,
            Err(EngineError::CarryoverNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_preview_and_commit_agree() {
        let f = fixture();
        play(&f.source, 4, 7);

        let preview = f.service.preview(&roster(), period(4)).await.unwrap();
        let committed = f.service.commit(&roster(), period(4)).await.unwrap();
        assert_eq!(preview.facility, committed.run.facility);
        assert_eq!(preview.carryover, committed.record.state);
    }

    #[tokio::test]
    async fn test_recommit_of_draft_replaces_it() {
        let f = fixture();
        play(&f.source, 4, 2);
        f.service.commit(&roster(), period(4)).await.unwrap();

        play(&f.source, 4, 3);
        let again = f.service.commit(&roster(), period(4)).await.unwrap();
        assert_eq!(again.record.state.current_month_wage, 300);
    }

    #[tokio::test]
    async fn test_earlier_month_cannot_change_under_a_later_one() {
        let f = fixture();
        play(&f.source, 3, 3);
        play(&f.source, 4, 4);
        f.service.commit(&roster(), period(3)).await.unwrap();
        let april = f.service.commit(&roster(), period(4)).await.unwrap();
        assert_eq!(april.record.state.previous_carryover, 300);

        play(&f.source, 3, 5);
        match f.service.commit(&roster(), period(3)).await {
            Err(EngineError::LaterMonthExists { month, later_month, .. }) => {
                assert_eq!(month, 3);
                assert_eq!(later_month, 4);
            }
            other => panic!("Expected LaterMonthExists, got {:?}", other),
        }

        let confirmed = f.service.confirm("fac-1", period(4)).await.unwrap();
        let march = f.service.carryover("fac-1", period(3)).await.unwrap();
        assert_eq!(march.state.next_carryover, confirmed.state.previous_carryover);
        assert_eq!(march.state.current_month_wage, 300);
    }

    #[tokio::test]
    async fn test_latest_draft_can_still_be_recommitted() {
        let f = fixture();
        play(&f.source, 3, 3);
        play(&f.source, 4, 4);
        f.service.commit(&roster(), period(3)).await.unwrap();
        f.service.commit(&roster(), period(4)).await.unwrap();

        play(&f.source, 4, 8);
        let april = f.service.commit(&roster(), period(4)).await.unwrap();
        assert_eq!(april.record.state.previous_carryover, 300);
        assert_eq!(april.record.state.payment_amount, 1100);
    }

    #[tokio::test]
    async fn test_facility_locks_are_released() {
        let f = fixture();
        play(&f.source, 4, 2);
        f.service.commit(&roster(), period(4)).await.unwrap();
        f.service.confirm("fac-1", period(4)).await.unwrap();
        assert!(f.service.commit(&roster(), period(4)).await.is_err());

        assert!(f.service.facility_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_month_cannot_be_recommitted() {
        let f = fixture();
        play(&f.source, 4, 2);
        f.service.commit(&roster(), period(4)).await.unwrap();
        f.service.confirm("fac-1", period(4)).await.unwrap();

        assert!(matches!(
            f.service.commit(&roster(), period(4)).await,
            Err(EngineError::MonthAlreadyFinalized { .. })
        ));

        let paid = f.service.mark_paid("fac-1", period(4)).await.unwrap();
        assert_eq!(paid.status, MonthStatus::Paid);
        assert_eq!(paid.state.current_month_wage, 200);
    }

    #[tokio::test]
    async fn test_failed_fetch_aborts_commit() {
        let f = fixture();
        f.source
            .fail_with("u1", SourceError::Transient("sheet locked".to_string()));

        match f.service.commit(&roster(), period(4)).await {
            Err(EngineError::SessionFetchFailed { user_id, attempts, .. }) => {
                assert_eq!(user_id, "u1");
                assert_eq!(attempts, 2);
            }
            other => panic!("Expected SessionFetchFailed, got {:?}", other),
        }
        assert!(f.service.carryover("fac-1", period(4)).await.is_err());

        let preview = f.service.preview(&roster(), period(4)).await.unwrap();
        assert_eq!(preview.facility.skipped_members.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_input_refuses_partial_roster() {
        let f = fixture();
        let input = FacilityMonthInput {
            facility_id: "fac-1".to_string(),
            period: period(4),
            plan_type: PlanType::Tiered,
            logs: vec![],
            skipped: vec![crate::models::SkippedMember {
                user_id: "u1".to_string(),
                user_name: "Aiko".to_string(),
                reason: "unavailable".to_string(),
            }],
        };
        assert!(matches!(
            f.service.commit_input(&input).await,
            Err(EngineError::IncompleteRoster { skipped: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_commits_of_one_month_leave_one_record() {
        let f = fixture();
        play(&f.source, 4, 6);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = f.service.clone();
                tokio::spawn(async move { service.commit(&roster(), period(4)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let record = f.service.carryover("fac-1", period(4)).await.unwrap();
        assert_eq!(record.state.current_month_wage, 600);
        assert_eq!(record.status, MonthStatus::Draft);
        assert!(f.service.facility_locks.lock().await.is_empty());
    }
}
