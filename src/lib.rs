//! Facility Wage Engine
//!
//! This crate calculates the monthly stipends paid to members of
//! disability-welfare day-service facilities from the therapeutic game
//! sessions they complete. It normalizes hand-typed activity logs, prices
//! sessions by tenure tier and game level, and carries balances below the
//! minimum payment forward month to month.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ledger;
pub mod models;
pub mod service;
