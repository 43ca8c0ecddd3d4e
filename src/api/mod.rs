//! HTTP API module for the Facility Wage Engine.
//!
//! This module provides the REST endpoints for previewing, committing,
//! confirming and paying out facility months, and for reading the stored
//! carryover.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CommitRequest, MemberLogRequest, MemberRequest, PreviewRequest, SessionRequest};
pub use response::{ApiError, ApiErrorResponse, CommitResponse};
pub use state::AppState;
