//! Error type system for Bookshelf
//!
//! This module provides the crate-wide error type with:
//! - Classification into the request-boundary taxonomy
//! - HTTP status code mapping
//! - Rendering into the `{code, message, errors, data}` response envelope

use crate::api::models::ApiResponse;
use crate::auth::jwt::TokenError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Main error type for the Bookshelf service
#[derive(Debug, thiserror::Error)]
pub enum ShelfError {
    // System-level errors
    #[error("System initialization failed: {0}")]
    InitializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(String),

    // Request errors
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    AuthenticationError(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Fatal credential subsystem errors
    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Token signing failed: {0}")]
    TokenSigningError(String),

    // I/O errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(String),
}

impl ShelfError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShelfError::ValidationError(_) => StatusCode::BAD_REQUEST,

            ShelfError::AuthenticationError(_) | ShelfError::Token(_) => StatusCode::UNAUTHORIZED,

            ShelfError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            ShelfError::NotFound(_) => StatusCode::NOT_FOUND,

            ShelfError::Conflict(_) => StatusCode::CONFLICT,

            ShelfError::InitializationError(_)
            | ShelfError::ConfigError(_)
            | ShelfError::DatabaseError(_)
            | ShelfError::PoolError(_)
            | ShelfError::HashingError(_)
            | ShelfError::TokenSigningError(_)
            | ShelfError::IoError(_)
            | ShelfError::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            ShelfError::InitializationError(_) => "InitializationError",
            ShelfError::ConfigError(_) => "ConfigError",
            ShelfError::DatabaseError(_) => "DatabaseError",
            ShelfError::PoolError(_) => "PoolError",
            ShelfError::ValidationError(_) => "ValidationError",
            ShelfError::AuthenticationError(_) => "AuthenticationError",
            ShelfError::Token(_) => "AuthenticationError",
            ShelfError::PermissionDenied(_) => "AuthorizationError",
            ShelfError::NotFound(_) => "NotFoundError",
            ShelfError::Conflict(_) => "ConflictError",
            ShelfError::HashingError(_) => "FatalError",
            ShelfError::TokenSigningError(_) => "FatalError",
            ShelfError::IoError(_) => "IoError",
            ShelfError::TaskError(_) => "TaskError",
        }
    }

    /// Short human-readable summary used as the envelope `message`
    pub fn summary(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Failed to process request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not found",
            StatusCode::CONFLICT => "Conflict",
            _ => "Internal server error",
        }
    }

    /// Whether the error is a server-side failure whose details must stay in the logs
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Error strings for the envelope `errors` list
    pub fn details(&self) -> Vec<String> {
        if self.is_internal() {
            return vec!["An internal error occurred".to_string()];
        }
        self.to_string()
            .split('\n')
            .map(|s| s.to_string())
            .collect()
    }
}

/// Implement IntoResponse for ShelfError so handlers can return it directly
impl IntoResponse for ShelfError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if self.is_internal() {
            tracing::error!(
                error_type = self.error_type(),
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        let body = ApiResponse::failure(status_code, self.summary(), self.details());
        (status_code, Json(body)).into_response()
    }
}

/// Result type alias for operations that can fail with ShelfError
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Context extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ShelfError::InitializationError(format!("{}: {}", context.into(), e)))
    }
}
