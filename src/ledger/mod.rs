//! Carryover persistence.
//!
//! The month-to-month carryover chain lives behind [`CarryoverStore`]. The
//! calculation itself never reads or writes it; callers pass the previous
//! balance in and persist the settled state.

mod store;

pub use store::{CarryoverStore, InMemoryCarryoverStore};
