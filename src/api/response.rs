//! Response types for the Facility Wage Engine API.
//!
//! This module defines the success bodies and the error response structures
//! returned by the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{CarryoverRecord, WageCalculation};

/// Body returned by the commit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResponse {
    /// The calculation that was stored.
    pub calculation: WageCalculation,
    /// The stored draft record.
    pub carryover: CarryoverRecord,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates an error response.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::NoTierConfigured { .. }
            | EngineError::MissingFlatRate
            | EngineError::MissingMinimumPayment => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details(
                    "CONFIG_ERROR",
                    "Wage schedule is incomplete",
                    message,
                ),
            ),
            EngineError::InvalidPeriod { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_PERIOD", message),
            ),
            EngineError::InvalidFacilityInput { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_INPUT", message),
            ),
            EngineError::IncompleteRoster { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INCOMPLETE_ROSTER", message),
            ),
            EngineError::SessionFetchFailed { .. } => (
                StatusCode::BAD_GATEWAY,
                ApiError::with_details(
                    "SESSION_FETCH_FAILED",
                    message,
                    "The session log source could not be read; nothing was stored",
                ),
            ),
            EngineError::MonthAlreadyFinalized { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("MONTH_FINALIZED", message),
            ),
            EngineError::LaterMonthExists { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("LATER_MONTH_EXISTS", message),
            ),
            EngineError::AmountOverflow { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("AMOUNT_OUT_OF_RANGE", message),
            ),
            EngineError::InvalidStatusTransition { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("INVALID_STATUS_TRANSITION", message),
            ),
            EngineError::CarryoverNotFound { .. } => (
                StatusCode::NOT_FOUND,
                ApiError::new("CARRYOVER_NOT_FOUND", message),
            ),
        };
        ApiErrorResponse { status, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_api_error_with_details_serialization() {
        let error = ApiError::with_details("TEST_ERROR", "Test message", "Some details");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"details\":\"Some details\""));
    }

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (EngineError::MissingMinimumPayment, StatusCode::INTERNAL_SERVER_ERROR),
            (
                EngineError::InvalidPeriod { year: 2025, month: 0 },
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::SessionFetchFailed {
                    user_id: "u1".to_string(),
                    attempts: 4,
                    message: "timeout".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                EngineError::MonthAlreadyFinalized {
                    facility_id: "fac-1".to_string(),
                    year: 2025,
                    month: 4,
                    status: "paid".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                EngineError::CarryoverNotFound {
                    facility_id: "fac-1".to_string(),
                    year: 2025,
                    month: 4,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::LaterMonthExists {
                    facility_id: "fac-1".to_string(),
                    year: 2025,
                    month: 3,
                    later_year: 2025,
                    later_month: 4,
                },
                StatusCode::CONFLICT,
            ),
            (
                EngineError::AmountOverflow {
                    context: "carryover balance".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            let response: ApiErrorResponse = error.into();
            assert_eq!(response.status, expected, "{}", response.error.code);
        }
    }

    #[test]
    fn test_fetch_failure_names_member() {
        let response: ApiErrorResponse = EngineError::SessionFetchFailed {
            user_id: "u-17".to_string(),
            attempts: 3,
            message: "sheet locked".to_string(),
        }
        .into();
        assert_eq!(response.error.code, "SESSION_FETCH_FAILED");
        assert!(response.error.message.contains("u-17"));
    }
}
