//! Error types for the Libris service
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - Machine-readable error codes for client handling
//! - Flattening into GraphQL errors as {message, extensions.code}
//!
//! Best-effort side effects (counter updates, metadata cleanup, remote
//! image deletion) never construct these at the caller boundary: their
//! failures are logged and swallowed at the call site.

use async_graphql::ErrorExtensions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    ValidationError,
    InvalidId,
    PayloadTooLarge,
    InvalidImageType,

    // Resources
    NotFound,
    BookNotFound,
    AuthorNotFound,
    ReviewNotFound,

    // Business rules
    AuthorHasBooks,

    // Rate limiting
    RateLimited,

    // Stores
    DatabaseError,
    DocStoreError,

    // External services
    ImageHostError,
    UpstreamError,

    // Internal
    InternalError,
    ConfigurationError,
}

impl ErrorCode {
    /// The wire form of this code, as placed in GraphQL error extensions
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidId => "INVALID_ID",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::InvalidImageType => "INVALID_IMAGE_TYPE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::BookNotFound => "BOOK_NOT_FOUND",
            ErrorCode::AuthorNotFound => "AUTHOR_NOT_FOUND",
            ErrorCode::ReviewNotFound => "REVIEW_NOT_FOUND",
            ErrorCode::AuthorHasBooks => "AUTHOR_HAS_BOOKS",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::DocStoreError => "DOC_STORE_ERROR",
            ErrorCode::ImageHostError => "IMAGE_HOST_ERROR",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid id: {value}")]
    InvalidId { value: String },

    #[error("File size must be less than {limit} bytes (got {size})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("File must be an image (got {mime})")]
    InvalidImageType { mime: String },

    // Resource errors
    #[error("Book not found: {id}")]
    BookNotFound { id: i32 },

    #[error("Author not found: {id}")]
    AuthorNotFound { id: i32 },

    #[error("Review not found: {id}")]
    ReviewNotFound { id: String },

    // Business rules
    #[error("Cannot delete author who has books. Please delete or reassign the books first.")]
    AuthorHasBooks { id: i32, count: u64 },

    // Rate limiting
    #[error("Too many requests, please try again later.")]
    RateLimited,

    // Store errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Document store error: {0}")]
    DocStore(#[from] mongodb::error::Error),

    // External service errors
    #[error("Image host error: {message}")]
    ImageHost { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidId { .. } => ErrorCode::InvalidId,
            AppError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            AppError::InvalidImageType { .. } => ErrorCode::InvalidImageType,
            AppError::BookNotFound { .. } => ErrorCode::BookNotFound,
            AppError::AuthorNotFound { .. } => ErrorCode::AuthorNotFound,
            AppError::ReviewNotFound { .. } => ErrorCode::ReviewNotFound,
            AppError::AuthorHasBooks { .. } => ErrorCode::AuthorHasBooks,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::DatabaseError,
            AppError::DocStore(_) => ErrorCode::DocStoreError,
            AppError::ImageHost { .. } => ErrorCode::ImageHostError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Whether this error is the caller's fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::InvalidId { .. }
                | AppError::PayloadTooLarge { .. }
                | AppError::InvalidImageType { .. }
                | AppError::BookNotFound { .. }
                | AppError::AuthorNotFound { .. }
                | AppError::ReviewNotFound { .. }
                | AppError::AuthorHasBooks { .. }
                | AppError::RateLimited
        )
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_client_error() {
            tracing::warn!(error = %message, code = code.as_str(), "Client error");
        } else {
            tracing::error!(error = %message, code = code.as_str(), "Server error");
        }

        async_graphql::Error::new(message).extend_with(|_, ext| ext.set("code", code.as_str()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::BookNotFound { id: 42 };
        assert_eq!(err.code(), ErrorCode::BookNotFound);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_business_rule_error() {
        let err = AppError::AuthorHasBooks { id: 1, count: 3 };
        assert_eq!(err.code(), ErrorCode::AuthorHasBooks);
        assert!(err.to_string().contains("reassign"));
    }

    #[test]
    fn test_graphql_extension_carries_code() {
        let err = AppError::AuthorNotFound { id: 7 };
        let gql = err.extend();
        assert_eq!(gql.message, "Author not found: 7");
        assert!(gql.extensions.is_some());
    }

    #[test]
    fn test_server_error() {
        let err = AppError::Internal {
            message: "Something went wrong".into(),
        };
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert!(!err.is_client_error());
    }
}
