//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors from the document mirror and the async store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Engine error: {0}")]
    Engine(#[from] brackets_engine::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Snapshot write failed for instance '{instance_id}': {reason}")]
    Persistence { instance_id: String, reason: String },
}

/// Result type for store and document operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<brackets_engine::Error> for AppError {
    fn from(err: brackets_engine::Error) -> Self {
        AppError::Store(Error::Engine(err))
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use brackets_engine::Error as EngineError;

        let (status, error_message, details) = match &self {
            AppError::Store(Error::Engine(e @ EngineError::InvalidSnapshot(_))) => {
                tracing::error!("Stored snapshot unreadable: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored snapshot is unreadable".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Store(Error::Engine(e)) => {
                tracing::warn!("Engine error: {:?}", e);
                let status = match e {
                    EngineError::PositionOutOfRange { .. } | EngineError::RecordNotFound { .. } => {
                        StatusCode::NOT_FOUND
                    }
                    EngineError::IdSpaceExhausted { .. } => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string(), None)
            }
            AppError::Store(e @ Error::Persistence { .. }) => {
                tracing::error!("Persistence error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Snapshot write failed".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = std::result::Result<T, AppError>;
