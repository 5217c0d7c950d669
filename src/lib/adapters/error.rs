use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::core::{StorageError, TodoError};

pub const SCHEMA_MISSING_HINT: &str =
    "Database table not found. Call POST /api/init-db or restart the server to create tables.";
pub const CONNECTION_UNAVAILABLE_HINT: &str =
    "Cannot connect to database. Please check your database connection.";

/// An HTTP error rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Create reports unclassified storage failures as a bad request.
    pub fn from_create(err: TodoError) -> Self {
        match err {
            TodoError::Storage(StorageError::Other(msg)) => {
                Self::new(StatusCode::BAD_REQUEST, format!("Error creating todo: {msg}"))
            }
            other => other.into(),
        }
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            TodoError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Todo not found"),
            TodoError::Storage(StorageError::SchemaMissing(_)) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, SCHEMA_MISSING_HINT)
            }
            TodoError::Storage(StorageError::ConnectionUnavailable(_)) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, CONNECTION_UNAVAILABLE_HINT)
            }
            TodoError::Storage(StorageError::Other(msg)) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
