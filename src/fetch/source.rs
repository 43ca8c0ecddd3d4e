//! The session log source boundary.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Period, RawSessionRow};

/// Failure reported by a session log source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The source may succeed if asked again (timeouts, rate limits, I/O hiccups).
    #[error("transient source failure: {0}")]
    Transient(String),

    /// Retrying will not help (bad sheet layout, unknown member, bad key).
    #[error("permanent source failure: {0}")]
    Permanent(String),
}

impl SourceError {
    /// Returns true if the operation is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

/// A provider of raw activity-log rows for one month.
///
/// Tiered facilities keep one log per member; entry-plan facilities keep a
/// single log for the whole facility.
#[async_trait]
pub trait SessionLogSource: Send + Sync {
    /// Fetches a member's rows for the month.
    async fn fetch_member_sessions(
        &self,
        user_id: &str,
        period: Period,
    ) -> Result<Vec<RawSessionRow>, SourceError>;

    /// Fetches a facility's aggregate rows for the month.
    async fn fetch_facility_sessions(
        &self,
        facility_id: &str,
        period: Period,
    ) -> Result<Vec<RawSessionRow>, SourceError>;
}

/// An in-memory source keyed by member or facility id.
///
/// Keys without rows return an empty log. Keys registered with
/// [`InMemorySessionSource::fail_with`] return that error on every call.
#[derive(Debug, Default)]
pub struct InMemorySessionSource {
    rows: RwLock<HashMap<(String, Period), Vec<RawSessionRow>>>,
    failures: RwLock<HashMap<String, SourceError>>,
}

impl InMemorySessionSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the rows for a member or facility month, replacing earlier rows.
    pub fn insert(&self, key: impl Into<String>, period: Period, rows: Vec<RawSessionRow>) {
        if let Ok(mut map) = self.rows.write() {
            map.insert((key.into(), period), rows);
        }
    }

    /// Makes every fetch for `key` fail with `error`.
    pub fn fail_with(&self, key: impl Into<String>, error: SourceError) {
        if let Ok(mut map) = self.failures.write() {
            map.insert(key.into(), error);
        }
    }

    fn lookup(&self, key: &str, period: Period) -> Result<Vec<RawSessionRow>, SourceError> {
        let failures = self
            .failures
            .read()
            .map_err(|_| SourceError::Transient("source lock poisoned".to_string()))?;
        if let Some(error) = failures.get(key) {
            return Err(error.clone());
        }
        drop(failures);

        let rows = self
            .rows
            .read()
            .map_err(|_| SourceError::Transient("source lock poisoned".to_string()))?;
        Ok(rows
            .get(&(key.to_string(), period))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl SessionLogSource for InMemorySessionSource {
    async fn fetch_member_sessions(
        &self,
        user_id: &str,
        period: Period,
    ) -> Result<Vec<RawSessionRow>, SourceError> {
        self.lookup(user_id, period)
    }

    async fn fetch_facility_sessions(
        &self,
        facility_id: &str,
        period: Period,
    ) -> Result<Vec<RawSessionRow>, SourceError> {
        self.lookup(facility_id, period)
    }
}
