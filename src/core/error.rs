//! Typed error handling for recordbook
//!
//! Every error that can reach an HTTP client is a variant of
//! [`RecordbookError`], grouped by category:
//!
//! - [`RecordError`]: record lookups and uniqueness
//! - [`ValidationError`]: rejected payloads, with per-field messages
//! - [`QueryError`]: malformed list/query parameters
//! - [`ConfigError`]: configuration parsing and validation
//! - [`StorageError`]: backend failures
//!
//! Storage services return `anyhow::Result` and raise these typed errors
//! inside it; the HTTP layer recovers them with
//! `RecordbookError::from(anyhow::Error)`, which downcasts before falling back
//! to an internal error.
//!
//! # Example
//!
//! ```rust,ignore
//! match service.get(&id).await {
//!     Ok(Some(record)) => println!("Found: {:?}", record),
//!     Ok(None) => return Err(RecordError::NotFound { collection, id }.into()),
//!     Err(e) => return Err(RecordbookError::from(e)),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// The main error type
#[derive(Debug, Error)]
pub enum RecordbookError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Anything else (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RecordbookError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecordbookError::Record(e) => e.status_code(),
            RecordbookError::Validation(_) => StatusCode::BAD_REQUEST,
            RecordbookError::Query(_) => StatusCode::BAD_REQUEST,
            RecordbookError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RecordbookError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RecordbookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            RecordbookError::Record(e) => e.error_code(),
            RecordbookError::Validation(_) => "VALIDATION_ERROR",
            RecordbookError::Query(e) => e.error_code(),
            RecordbookError::Config(_) => "CONFIG_ERROR",
            RecordbookError::Storage(_) => "STORAGE_ERROR",
            RecordbookError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            RecordbookError::Record(RecordError::NotFound { collection, id }) => {
                Some(serde_json::json!({
                    "collection": collection,
                    "id": id.to_string()
                }))
            }
            RecordbookError::Record(RecordError::DuplicateKey {
                collection,
                field,
                value,
            }) => Some(serde_json::json!({
                "collection": collection,
                "field": field,
                "value": value
            })),
            RecordbookError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            RecordbookError::Query(QueryError::UnknownField { field, .. }) => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        }
    }
}

impl From<anyhow::Error> for RecordbookError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<RecordbookError>() {
            Ok(e) => return e,
            Err(err) => err,
        };
        let err = match err.downcast::<RecordError>() {
            Ok(e) => return e.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<ValidationError>() {
            Ok(e) => return e.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<QueryError>() {
            Ok(e) => return e.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<StorageError>() {
            Ok(e) => return e.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<ConfigError>() {
            Ok(e) => return e.into(),
            Err(err) => err,
        };
        RecordbookError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for RecordbookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Record Errors
// =============================================================================

/// Errors related to record lookups and uniqueness
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{collection} record with id '{id}' not found")]
    NotFound { collection: String, id: Uuid },

    /// A unique field already holds this value in another record
    #[error("{collection} with {field} '{value}' already exists")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    #[error("Unknown collection: {collection}")]
    UnknownCollection { collection: String },

    #[error("Invalid record id '{value}'")]
    InvalidId { value: String },
}

impl RecordError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecordError::NotFound { .. } => StatusCode::NOT_FOUND,
            RecordError::DuplicateKey { .. } => StatusCode::CONFLICT,
            RecordError::UnknownCollection { .. } => StatusCode::NOT_FOUND,
            RecordError::InvalidId { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RecordError::NotFound { .. } => "RECORD_NOT_FOUND",
            RecordError::DuplicateKey { .. } => "DUPLICATE_KEY",
            RecordError::UnknownCollection { .. } => "UNKNOWN_COLLECTION",
            RecordError::InvalidId { .. } => "INVALID_ID",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Individual field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl FieldValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more fields failed validation
    #[error("Validation failed: {}", format_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// The payload was not a JSON object
    #[error("Expected a JSON object, got {found}")]
    NotAnObject { found: String },
}

impl ValidationError {
    /// Field names that failed, in order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ValidationError::FieldErrors(errors) => {
                errors.iter().map(|e| e.field.as_str()).collect()
            }
            ValidationError::NotAnObject { .. } => Vec::new(),
        }
    }
}

fn format_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised while turning request parameters into a query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Page must be at least 1 (got {page})")]
    InvalidPage { page: usize },

    #[error("Page size must be at least 1 (got {page_size})")]
    InvalidPageSize { page_size: usize },

    #[error("Unknown field '{field}' for {collection}")]
    UnknownField { collection: String, field: String },

    #[error("Invalid filter: {message}")]
    InvalidFilter { message: String },

    #[error("Invalid sort direction '{value}'")]
    InvalidSort { value: String },
}

impl QueryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::InvalidPage { .. } => "INVALID_PAGE",
            QueryError::InvalidPageSize { .. } => "INVALID_PAGE_SIZE",
            QueryError::UnknownField { .. } => "UNKNOWN_FIELD",
            QueryError::InvalidFilter { .. } => "INVALID_FILTER",
            QueryError::InvalidSort { .. } => "INVALID_SORT",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config{}: {message}", describe_file(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

fn describe_file(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage connection failed: {message}")]
    Connection { message: String },

    #[error("Storage {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },
}
