//! Error Handling Module
//!
//! Maps domain and infrastructure errors onto HTTP status codes.
//! Uses thiserror for the error type and tracing for server-side detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eco_impact::ImpactError;
use serde::Serialize;
use thiserror::Error;

/// API error type
///
/// Client errors map to 4xx, server errors to 5xx. Internal detail from
/// 5xx errors is logged, never returned.
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    // ============ 404 Not Found ============
    #[error("Resource not found: {0}")]
    NotFound(String),

    // ============ 500 Internal Server Error ============
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    InternalError,
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // 4xx
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
            ApiError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(msg.clone()),
            ),
            ApiError::InsufficientStock(msg) => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_STOCK",
                msg.clone(),
                None,
            ),
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", resource),
                None,
            ),

            // 5xx
            ApiError::DatabaseError(_) => {
                tracing::error!("Database error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                    None,
                )
            }
            ApiError::InternalError => {
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ImpactError> for ApiError {
    fn from(err: ImpactError) -> Self {
        match err {
            ImpactError::ProductNotFound { product_id } => {
                ApiError::NotFound(format!("Product {}", product_id))
            }
            ImpactError::InsufficientStock { .. } => ApiError::InsufficientStock(err.to_string()),
            ImpactError::InvalidCoefficient { .. } => {
                tracing::error!("Coefficient error: {}", err);
                ApiError::InternalError
            }
            other => ApiError::ValidationError(other.to_string()),
        }
    }
}

/// SQLx error to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("SQLx error: {:?}", err);
        ApiError::DatabaseError(err.to_string())
    }
}

/// anyhow error to ApiError
///
/// Store methods report stock races and missing rows as [`ImpactError`]
/// inside anyhow; those keep their client-facing meaning.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ImpactError>() {
            Ok(impact) => impact.into(),
            Err(err) => {
                tracing::error!("Anyhow error: {:?}", err);
                ApiError::InternalError
            }
        }
    }
}
