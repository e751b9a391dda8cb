// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Kakao API error: {0}")]
    KakaoApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error is reported to clients as 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = match &self {
            AppError::Unauthorized => ("unauthorized", None),
            AppError::BadRequest(msg) => ("bad_request", Some(msg.clone())),
            AppError::KakaoApi(msg) => {
                tracing::error!(error = %msg, "Kakao API error");
                ("kakao_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("database_error", None)
            }
            AppError::TokenStore(msg) => {
                tracing::error!(error = %msg, "Token store error");
                ("token_store_error", None)
            }
            AppError::Timeout(msg) => {
                tracing::error!(operation = %msg, "External call timed out");
                ("timeout", None)
            }
            AppError::Config(err) => {
                tracing::error!(error = %err, "Configuration error");
                ("internal_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

/// Run an external call under a deadline.
///
/// Errors from the call itself are mapped with `map_err`; an elapsed deadline
/// becomes [`AppError::Timeout`] naming `operation`.
pub async fn with_timeout<T, E, F>(
    timeout: Duration,
    operation: &str,
    fut: F,
    map_err: impl FnOnce(E) -> AppError,
) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(map_err),
        Err(_) => Err(AppError::Timeout(operation.to_string())),
    }
}
