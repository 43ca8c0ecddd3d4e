//! Session log fetching.
//!
//! The calculation is pure; this module is where raw activity logs come in
//! from outside. [`SessionLogSource`] is the adapter boundary,
//! [`retry_with_backoff`] handles flaky sources and [`fetch_month`] gathers a
//! whole roster before anything is priced.

mod csv_source;
mod retry;
mod roster;
mod source;

pub use csv_source::CsvSessionSource;
pub use retry::{RetryFailure, RetryPolicy, retry_with_backoff};
pub use roster::{DEFAULT_FETCH_CONCURRENCY, FetchFailure, RosterFetch, fetch_month};
pub use source::{InMemorySessionSource, SessionLogSource, SourceError};
