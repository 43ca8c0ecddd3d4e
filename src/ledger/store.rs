//! The carryover store boundary and its in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::models::{CarryoverRecord, CarryoverState, MonthStatus, Period};

/// Persistence for the month-to-month carryover chain.
///
/// There is at most one record per facility and month. Draft records may be
/// overwritten by a recalculation; confirmed and paid records may not. A month
/// can only be written while no later month is recorded, since the later
/// month's previous carryover was read from it.
#[async_trait]
pub trait CarryoverStore: Send + Sync {
    /// Returns the record for a facility-month, if any.
    async fn get(&self, facility_id: &str, period: Period) -> EngineResult<Option<CarryoverRecord>>;

    /// Returns the latest recorded month for a facility, if any.
    async fn latest_period(&self, facility_id: &str) -> EngineResult<Option<Period>>;

    /// Inserts or replaces the draft for a facility-month.
    ///
    /// Fails with `MonthAlreadyFinalized` when the stored record is confirmed
    /// or paid, and with `LaterMonthExists` when a later month is recorded.
    async fn save_draft(
        &self,
        facility_id: &str,
        period: Period,
        state: CarryoverState,
        minimum_payment: i64,
    ) -> EngineResult<CarryoverRecord>;

    /// Moves a record forward (`draft → confirmed → paid`).
    ///
    /// Fails with `CarryoverNotFound` or `InvalidStatusTransition`.
    async fn set_status(
        &self,
        facility_id: &str,
        period: Period,
        status: MonthStatus,
    ) -> EngineResult<CarryoverRecord>;

    /// The carryover entering `period`: the previous month's `next_carryover`,
    /// or 0 when that month has no record.
    async fn previous_carryover(&self, facility_id: &str, period: Period) -> EngineResult<i64> {
        Ok(self
            .get(facility_id, period.previous())
            .await?
            .map(|record| record.state.next_carryover)
            .unwrap_or(0))
    }
}

/// A [`CarryoverStore`] held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCarryoverStore {
    records: RwLock<HashMap<(String, Period), CarryoverRecord>>,
}

impl InMemoryCarryoverStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record for a facility in period order.
    pub async fn history(&self, facility_id: &str) -> Vec<CarryoverRecord> {
        let records = self.records.read().await;
        let mut history: Vec<CarryoverRecord> = records
            .values()
            .filter(|record| record.facility_id == facility_id)
            .cloned()
            .collect();
        history.sort_by_key(|record| record.period);
        history
    }
}

fn latest_in(
    records: &HashMap<(String, Period), CarryoverRecord>,
    facility_id: &str,
) -> Option<Period> {
    records
        .keys()
        .filter(|(id, _)| id == facility_id)
        .map(|(_, period)| *period)
        .max()
}

#[async_trait]
impl CarryoverStore for InMemoryCarryoverStore {
    async fn get(&self, facility_id: &str, period: Period) -> EngineResult<Option<CarryoverRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&(facility_id.to_string(), period)).cloned())
    }

    async fn latest_period(&self, facility_id: &str) -> EngineResult<Option<Period>> {
        let records = self.records.read().await;
        Ok(latest_in(&records, facility_id))
    }

    async fn save_draft(
        &self,
        facility_id: &str,
        period: Period,
        state: CarryoverState,
        minimum_payment: i64,
    ) -> EngineResult<CarryoverRecord> {
        let mut records = self.records.write().await;
        let key = (facility_id.to_string(), period);

        if let Some(later) = latest_in(&records, facility_id).filter(|p| *p > period) {
            return Err(EngineError::LaterMonthExists {
                facility_id: facility_id.to_string(),
                year: period.year,
                month: period.month,
                later_year: later.year,
                later_month: later.month,
            });
        }

        if let Some(existing) = records.get(&key).filter(|r| r.status.is_finalized()) {
            return Err(EngineError::MonthAlreadyFinalized {
                facility_id: facility_id.to_string(),
                year: period.year,
                month: period.month,
                status: existing.status.to_string(),
            });
        }

        let record = CarryoverRecord {
            facility_id: facility_id.to_string(),
            period,
            state,
            minimum_payment,
            status: MonthStatus::Draft,
            updated_at: Utc::now(),
        };
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn set_status(
        &self,
        facility_id: &str,
        period: Period,
        status: MonthStatus,
    ) -> EngineResult<CarryoverRecord> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&(facility_id.to_string(), period))
            .ok_or_else(|| EngineError::CarryoverNotFound {
                facility_id: facility_id.to_string(),
                year: period.year,
                month: period.month,
            })?;

        if !record.status.can_transition_to(status) {
            return Err(EngineError::InvalidStatusTransition {
                facility_id: facility_id.to_string(),
                from: record.status.to_string(),
                to: status.to_string(),
            });
        }

        record.status = status;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}
