//! Error Types for the Leadbook API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - Conversion from the engine's `LeadbookError` taxonomy
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leadbook_core::{
    AssignmentError, EntityType, LeadbookError, StorageError, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field value is out of valid range
    InvalidRange,

    /// Request body is not valid JSON for the endpoint
    InvalidFormat,

    /// Every selected lead was already given to the agent at some point
    NoQualifyingLeads,

    /// The unassigned pool holds nothing the agent has not already seen
    NoCandidates,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested agent does not exist or cannot receive leads
    AgentNotFound,

    /// Requested lead does not exist
    LeadNotFound,

    /// Agent currently holds no leads
    NothingToUnassign,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Entity with the same identifier already exists
    EntityAlreadyExists,

    /// Agent still holds leads and cannot be removed
    AgentHasAssignments,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Store operation failed
    DatabaseError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange
            | ErrorCode::InvalidFormat
            | ErrorCode::NoQualifyingLeads
            | ErrorCode::NoCandidates => StatusCode::BAD_REQUEST,

            ErrorCode::AgentNotFound
            | ErrorCode::LeadNotFound
            | ErrorCode::NothingToUnassign => StatusCode::NOT_FOUND,

            ErrorCode::EntityAlreadyExists | ErrorCode::AgentHasAssignments => {
                StatusCode::CONFLICT
            }

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
///
/// This type is returned by all API endpoints when an error occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (offending field, counts, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn agent_not_found(agent_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::AgentNotFound,
            format!("Agent {} not found", agent_id),
        )
    }

    pub fn lead_not_found(lead_id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::LeadNotFound, format!("Lead {} not found", lead_id))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Lets handlers return `ApiError` directly.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

/// Malformed or mistyped JSON bodies are client errors, not 422s.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(ErrorCode::InvalidFormat, rejection.body_text())
    }
}

// ============================================================================
// CONVERSIONS FROM ENGINE ERRORS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        match err {
            ValidationError::RequiredFieldMissing { field } => {
                ApiError::new(ErrorCode::MissingField, message)
                    .with_details(serde_json::json!({ "field": field }))
            }
            ValidationError::InvalidValue { field, .. } => {
                ApiError::new(ErrorCode::InvalidInput, message)
                    .with_details(serde_json::json!({ "field": field }))
            }
            ValidationError::ConstraintViolation { constraint, .. } => {
                ApiError::new(ErrorCode::InvalidRange, message)
                    .with_details(serde_json::json!({ "constraint": constraint }))
            }
        }
    }
}

impl From<AssignmentError> for ApiError {
    fn from(err: AssignmentError) -> Self {
        let message = err.to_string();
        match err {
            AssignmentError::AgentNotFound { agent_id } => ApiError::agent_not_found(agent_id),
            AssignmentError::NoQualifyingLeads {
                agent_id,
                requested,
                already_seen,
            } => ApiError::new(ErrorCode::NoQualifyingLeads, message).with_details(
                serde_json::json!({
                    "agentId": agent_id,
                    "requestedCount": requested,
                    "skippedCount": already_seen,
                }),
            ),
            AssignmentError::NoCandidates { agent_id } => {
                ApiError::new(ErrorCode::NoCandidates, message)
                    .with_details(serde_json::json!({ "agentId": agent_id }))
            }
            AssignmentError::NothingToUnassign { agent_id } => {
                ApiError::new(ErrorCode::NothingToUnassign, message)
                    .with_details(serde_json::json!({ "agentId": agent_id }))
            }
            AssignmentError::AgentHasAssignments { agent_id, count } => {
                ApiError::new(ErrorCode::AgentHasAssignments, message).with_details(
                    serde_json::json!({ "agentId": agent_id, "assignedLeadCount": count }),
                )
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound {
                entity_type: EntityType::Agent,
                id,
            } => ApiError::agent_not_found(id),
            StorageError::NotFound {
                entity_type: EntityType::Lead,
                id,
            } => ApiError::lead_not_found(id),
            StorageError::InsertFailed { entity_type, reason } if reason == "already exists" => {
                ApiError::new(
                    ErrorCode::EntityAlreadyExists,
                    format!("{:?} already exists", entity_type),
                )
            }
            other => {
                // Log the full error; the response stays generic
                tracing::error!(error = %other, "Store operation failed");
                ApiError::database_error("Database operation failed")
            }
        }
    }
}

impl From<LeadbookError> for ApiError {
    fn from(err: LeadbookError) -> Self {
        match err {
            LeadbookError::Validation(e) => e.into(),
            LeadbookError::Assignment(e) => e.into(),
            LeadbookError::Storage(e) => e.into(),
            LeadbookError::Config(e) => {
                tracing::error!(error = %e, "Configuration error");
                ApiError::internal_error("Service is misconfigured")
            }
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
