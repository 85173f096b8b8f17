//! Error types and handling for the proxy.
//!
//! This module provides a unified error type [`AppError`] that wraps various error sources
//! and implements proper HTTP response conversion. Error bodies are short plain-text
//! reasons; nothing about credentials or upstream internals is echoed back.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// HTTP request errors from the upstream client
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Missing or mismatching bearer credential
    #[error("Unauthorized")]
    Unauthorized,

    /// Client provided invalid data
    #[error("{0}")]
    BadRequest(String),

    /// Inbound body exceeded the configured limit
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Upstream did not answer within the configured ceiling
    #[error("Gateway timeout")]
    Timeout,

    /// Generic internal server errors with custom message
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Request(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::Request(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Config(e) => {
                tracing::error!(error = %e, "Configuration error while serving request");
                "Internal Server Error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error while serving request");
                "Internal Server Error".to_string()
            }
            AppError::Request(e) => {
                tracing::warn!(error = %e, "Upstream request failed");
                if e.is_timeout() {
                    "Gateway timeout".to_string()
                } else {
                    "Bad Gateway".to_string()
                }
            }
            other => other.to_string(),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
