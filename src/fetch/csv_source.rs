//! Session logs read from spreadsheet CSV exports.
//!
//! Each member (or entry-plan facility) has a directory of monthly exports:
//!
//! ```text
//! <root>/
//! ├── u-101/
//! │   ├── 2025-03.csv
//! │   └── 2025-04.csv
//! └── fac-2/
//!     └── 2025-04.csv
//! ```
//!
//! Files carry `date,game_name` headers. Dates may be `YYYY-MM-DD` or
//! `YYYYMMDD`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{Period, RawSessionRow};

use super::source::{SessionLogSource, SourceError};

/// Reads monthly CSV exports from a directory tree.
#[derive(Debug, Clone)]
pub struct CsvSessionSource {
    root: PathBuf,
}

impl CsvSessionSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the export path for a key and month.
    ///
    /// # Errors
    ///
    /// Keys that are blank or could escape the root directory are rejected.
    pub fn export_path(&self, key: &str, period: Period) -> Result<PathBuf, SourceError> {
        let invalid = key.trim().is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\'])
            || key.contains("..");
        if invalid {
            return Err(SourceError::Permanent(format!(
                "invalid session log key '{}'",
                key
            )));
        }
        Ok(self.root.join(key).join(format!("{}.csv", period)))
    }

    async fn read_rows(&self, key: &str, period: Period) -> Result<Vec<RawSessionRow>, SourceError> {
        let path = self.export_path(key, period)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No export for month, treating as empty");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(SourceError::Transient(format!(
                    "failed to read {}: {}",
                    path.display(),
                    err
                )));
            }
        };

        parse_export(&bytes, &path, period)
    }
}

/// Parses one export. Rows with unreadable dates or dates outside the month
/// are skipped with a warning; undecodable bytes in a game name are replaced
/// rather than failing the whole export.
fn parse_export(bytes: &[u8], path: &Path, period: Period) -> Result<Vec<RawSessionRow>, SourceError> {
    let malformed = |message: String| {
        SourceError::Permanent(format!("malformed export {}: {}", path.display(), message))
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.byte_headers().map_err(|e| malformed(e.to_string()))?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| {
                let h = String::from_utf8_lossy(h);
                h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| malformed(format!("missing '{}' column", name)))
    };
    let date_col = column("date")?;
    let game_col = column("game_name")?;

    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|e| malformed(e.to_string()))?;
        let line = index + 2;

        let Some(date) = get_date_field(&record, date_col) else {
            warn!(
                path = %path.display(),
                line,
                value = %get_text_field(&record, date_col),
                "Skipping row with unreadable date"
            );
            continue;
        };
        if !period.contains(date) {
            warn!(
                path = %path.display(),
                line,
                date = %date,
                "Skipping row dated outside the export month"
            );
            continue;
        }

        let game_name = get_text_field(&record, game_col);
        if std::str::from_utf8(record.get(game_col).unwrap_or_default()).is_err() {
            warn!(
                path = %path.display(),
                line,
                game_name = %game_name,
                "Game name is not valid UTF-8; decoded lossily"
            );
        }
        rows.push(RawSessionRow::new(date, game_name));
    }

    Ok(rows)
}

/// Decodes a field, replacing invalid UTF-8 sequences.
fn get_text_field(record: &csv::ByteRecord, index: usize) -> String {
    record
        .get(index)
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .unwrap_or_default()
}

fn get_date_field(record: &csv::ByteRecord, index: usize) -> Option<NaiveDate> {
    let text = std::str::from_utf8(record.get(index)?).ok()?.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y%m%d"))
        .ok()
}

#[async_trait]
impl SessionLogSource for CsvSessionSource {
    async fn fetch_member_sessions(
        &self,
        user_id: &str,
        period: Period,
    ) -> Result<Vec<RawSessionRow>, SourceError> {
        self.read_rows(user_id, period).await
    }

    async fn fetch_facility_sessions(
        &self,
        facility_id: &str,
        period: Period,
    ) -> Result<Vec<RawSessionRow>, SourceError> {
        self.read_rows(facility_id, period).await
    }
}
