//! # Error Handling
//!
//! This module defines the application-wide error type and converts it into
//! HTTP responses. The mapping follows a simple taxonomy: validation and
//! verification failures are 400, unknown users/resources are 404, missing
//! or bad credentials are 401, rate-limited contact attempts are 429,
//! assistant polling timeouts are 408, everything unexpected is 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type.
///
/// The `#[from]` attributes let library errors flow through `?` in handlers
/// and the db/webauthn layers without manual conversion.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors (SQLx).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// WebAuthn protocol errors: invalid signature, mismatched challenge,
    /// malformed attestation and friends.
    #[error("WebAuthn error: {0}")]
    WebAuthn(#[from] webauthn_rs::prelude::WebauthnError),

    /// JSON serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failures talking to the hosted assistant API.
    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Requested user, credential, challenge or post doesn't exist (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client sent invalid data: bad step, malformed body, failed
    /// verification (400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid session token (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Too many requests from one client (429).
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Upstream did not answer in time (408).
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Unexpected errors (500).
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Internals are logged for debugging; clients get a generic message
        // so database/library details don't leak.
        let (status, error_message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::WebAuthn(e) => {
                tracing::error!("WebAuthn error: {:?}", e);
                (StatusCode::BAD_REQUEST, "Verification failed".to_string())
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string())
            }
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Upstream service error".to_string())
            }
            // For these, the message is safe to show to clients.
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::Timeout(msg) => (StatusCode::REQUEST_TIMEOUT, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Convenience alias for handler and db-layer results.
pub type AppResult<T> = Result<T, AppError>;
