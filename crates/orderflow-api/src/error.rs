//! Orderflow API — error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orderflow_core::error::DomainError;
use orderflow_queue::WorkerError;
use rdkafka::error::KafkaError;
use serde::Serialize;
use thiserror::Error;

/// Startup and shutdown errors for the API server process.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying the schema migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The cache could not be reached at startup.
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// A Kafka client could not be created.
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),

    /// The order worker stopped with an error.
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "order_not_found"),
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::Publish(_) => (StatusCode::SERVICE_UNAVAILABLE, "queue_unavailable"),
            DomainError::Codec(_) => (StatusCode::INTERNAL_SERVER_ERROR, "codec_error"),
            DomainError::Persist(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            DomainError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "cache_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
