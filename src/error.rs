// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// A single-field validation failure from the normalizer.
///
/// `field` carries the wire name of the offending field (camelCase) so
/// the consuming layer can highlight it; `reason` is always specific,
/// never a generic message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// A structurally invalid import payload. The whole batch is rejected;
/// zero records are written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportError {
    pub reason: String,
}

impl ImportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import failed: {}", self.reason)
    }
}

impl std::error::Error for ImportError {}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 400 Bad Request with field/reason detail
    Validation(ValidationError),

    // 400 Bad Request, whole import rejected
    Import(ImportError),

    // 404 Not Found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": err.to_string(), "field": err.field, "reason": err.reason }),
            ),
            AppError::Import(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": err.to_string(), "reason": err.reason }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        AppError::Import(err)
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Serialization only happens on the way out (exports of data we
/// already validated), so a `serde_json::Error` is a server fault, not
/// a bad request.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_json_errors_map_to_internal() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(matches!(AppError::from(err), AppError::InternalServerError(_)));
    }

    #[test]
    fn validation_error_carries_field_and_reason() {
        let err = ValidationError::new("obtainedMarks", "exceeds maxMarks");
        assert_eq!(err.to_string(), "obtainedMarks: exceeds maxMarks");
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }
}
