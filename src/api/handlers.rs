//! HTTP request handlers for the Facility Wage Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{Period, WageCalculation};

use super::request::{CommitRequest, PreviewRequest};
use super::response::{ApiError, ApiErrorResponse, CommitResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/wages/preview", post(preview_handler))
        .route(
            "/facilities/:facility_id/wages/:year/:month/commit",
            post(commit_handler),
        )
        .route(
            "/facilities/:facility_id/wages/:year/:month/confirm",
            post(confirm_handler),
        )
        .route(
            "/facilities/:facility_id/wages/:year/:month/paid",
            post(paid_handler),
        )
        .route(
            "/facilities/:facility_id/carryover/:year/:month",
            get(carryover_handler),
        )
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

/// Turns a body rejection into a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Handler for `POST /wages/preview`.
///
/// Calculates a month from inline session rows. Nothing is stored.
async fn preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing wage preview request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let (input, previous_carryover) = match request.into_input() {
        Ok(converted) => converted,
        Err(err) => return error_response(correlation_id, err),
    };

    let start_time = Instant::now();
    match state.service().preview_input(&input, previous_carryover) {
        Ok(run) => {
            info!(
                correlation_id = %correlation_id,
                facility_id = %input.facility_id,
                period = %input.period,
                members = run.facility.member_count,
                total_amount = run.facility.total_amount,
                payment_amount = run.carryover.payment_amount,
                warnings = run.audit_trace.warnings.len(),
                duration_us = start_time.elapsed().as_micros() as u64,
                "Preview completed successfully"
            );
            json_response(StatusCode::OK, WageCalculation::from(run))
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for `POST /facilities/:facility_id/wages/:year/:month/commit`.
///
/// Fetches session logs for the roster, calculates the month and stores it
/// as a draft.
async fn commit_handler(
    State(state): State<AppState>,
    Path((facility_id, year, month)): Path<(String, i32, u32)>,
    payload: Result<Json<CommitRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        facility_id = %facility_id,
        year,
        month,
        "Processing wage commit request"
    );

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let prepared = Period::new(year, month)
        .and_then(|period| Ok((period, request.into_roster(&facility_id)?)));
    let (period, roster) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => return error_response(correlation_id, err),
    };

    let start_time = Instant::now();
    match state.service().commit(&roster, period).await {
        Ok(outcome) => {
            info!(
                correlation_id = %correlation_id,
                facility_id = %facility_id,
                period = %period,
                total_amount = outcome.run.facility.total_amount,
                payment_amount = outcome.record.state.payment_amount,
                next_carryover = outcome.record.state.next_carryover,
                duration_us = start_time.elapsed().as_micros() as u64,
                "Commit completed successfully"
            );
            json_response(
                StatusCode::OK,
                CommitResponse {
                    calculation: outcome.run.into(),
                    carryover: outcome.record,
                },
            )
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for `POST /facilities/:facility_id/wages/:year/:month/confirm`.
async fn confirm_handler(
    State(state): State<AppState>,
    Path((facility_id, year, month)): Path<(String, i32, u32)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, facility_id = %facility_id, year, month, "Confirming month");

    let result = match Period::new(year, month) {
        Ok(period) => state.service().confirm(&facility_id, period).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(record) => json_response(StatusCode::OK, record),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for `POST /facilities/:facility_id/wages/:year/:month/paid`.
async fn paid_handler(
    State(state): State<AppState>,
    Path((facility_id, year, month)): Path<(String, i32, u32)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, facility_id = %facility_id, year, month, "Marking month paid");

    let result = match Period::new(year, month) {
        Ok(period) => state.service().mark_paid(&facility_id, period).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(record) => json_response(StatusCode::OK, record),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for `GET /facilities/:facility_id/carryover/:year/:month`.
async fn carryover_handler(
    State(state): State<AppState>,
    Path((facility_id, year, month)): Path<(String, i32, u32)>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let result = match Period::new(year, month) {
        Ok(period) => state.service().carryover(&facility_id, period).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(record) => json_response(StatusCode::OK, record),
        Err(err) => error_response(correlation_id, err),
    }
}
