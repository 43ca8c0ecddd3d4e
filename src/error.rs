//! Error types for the Facility Wage Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while pricing a facility month.

use thiserror::Error;

/// The main error type for the Facility Wage Engine.
///
/// Configuration errors are fatal to a calculation run. Input-quality issues
/// such as an unrecognized game name never surface here; they are recorded as
/// audit warnings and the affected sessions are left unpaid.
///
/// # Example
///
/// ```
/// use wage_engine::error::EngineError;
///
/// let error = EngineError::NoTierConfigured { months: 14 };
/// assert_eq!(error.to_string(), "No rate tier configured for 14 continuation months");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No rate tier covers the given tenure.
    #[error("No rate tier configured for {months} continuation months")]
    NoTierConfigured {
        /// The tenure that could not be matched.
        months: u32,
    },

    /// The entry plan was selected but no flat rate is configured.
    #[error("Flat rate for the entry plan is not configured")]
    MissingFlatRate,

    /// No minimum payment threshold is configured.
    #[error("Minimum payment threshold is not configured")]
    MissingMinimumPayment,

    /// A target year/month was out of range.
    #[error("Invalid period {year}-{month}")]
    InvalidPeriod {
        /// The requested year.
        year: i32,
        /// The requested month.
        month: u32,
    },

    /// The facility input was inconsistent with its plan type.
    #[error("Invalid input for facility '{facility_id}': {message}")]
    InvalidFacilityInput {
        /// The facility being calculated.
        facility_id: String,
        /// A description of the inconsistency.
        message: String,
    },

    /// A session log could not be fetched after all retries.
    #[error("Failed to fetch sessions for '{user_id}' after {attempts} attempt(s): {message}")]
    SessionFetchFailed {
        /// The member (or facility, for entry plans) whose log failed.
        user_id: String,
        /// How many attempts were made.
        attempts: u32,
        /// The last error reported by the source.
        message: String,
    },

    /// A commit was attempted with members whose logs were not fetched.
    #[error("Facility '{facility_id}' has {skipped} skipped member(s); refusing to commit a partial result")]
    IncompleteRoster {
        /// The facility being committed.
        facility_id: String,
        /// Number of members missing from the result.
        skipped: usize,
    },

    /// The month has been confirmed or paid and can no longer be recalculated.
    #[error("Carryover for facility '{facility_id}' {year}-{month:02} is already {status}")]
    MonthAlreadyFinalized {
        /// The facility.
        facility_id: String,
        /// The year of the finalized month.
        year: i32,
        /// The finalized month.
        month: u32,
        /// The current status of the record.
        status: String,
    },

    /// A status change would move a record backwards or skip a step.
    #[error("Cannot move carryover for facility '{facility_id}' from {from} to {to}")]
    InvalidStatusTransition {
        /// The facility.
        facility_id: String,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },

    /// A later month is already recorded, so this month's carryover can no
    /// longer change.
    #[error(
        "Cannot recalculate facility '{facility_id}' {year}-{month:02}: {later_year}-{later_month:02} is already recorded"
    )]
    LaterMonthExists {
        /// The facility.
        facility_id: String,
        /// The year that was to be recalculated.
        year: i32,
        /// The month that was to be recalculated.
        month: u32,
        /// The year of the latest recorded month.
        later_year: i32,
        /// The latest recorded month.
        later_month: u32,
    },

    /// A money amount left the representable range.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow {
        /// What was being summed.
        context: String,
    },

    /// No carryover record exists for the facility-month.
    #[error("No carryover record for facility '{facility_id}' {year}-{month:02}")]
    CarryoverNotFound {
        /// The facility.
        facility_id: String,
        /// The requested year.
        year: i32,
        /// The requested month.
        month: u32,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
