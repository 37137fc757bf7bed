//! Error types for PaperDigest
//!
//! Provides a single error enum shared by every crate with:
//! - Distinct variants for caller-contract violations and upstream failures
//! - Machine-readable error codes for callers rendering messages
//! - Enough context (paper id, operation, upstream message) to act on

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Caller errors (1xxx)
    EmptyInput,
    InsufficientInput,
    ValidationError,

    // Resource errors (4xxx)
    UnknownPaper,

    // Upstream errors (8xxx)
    GenerationServiceError,
    EmbeddingError,
    ExtractionError,
    DiscoveryError,
    UpstreamError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
    IoError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::EmptyInput => 1001,
            ErrorCode::InsufficientInput => 1002,
            ErrorCode::ValidationError => 1003,

            ErrorCode::UnknownPaper => 4001,

            ErrorCode::GenerationServiceError => 8001,
            ErrorCode::EmbeddingError => 8002,
            ErrorCode::ExtractionError => 8003,
            ErrorCode::DiscoveryError => 8004,
            ErrorCode::UpstreamError => 8005,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::IoError => 9004,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Structural errors, detected locally and never retried
    #[error("Empty input for {operation}: nothing to process")]
    EmptyInput { operation: String },

    #[error("Unknown paper: no index for {paper_id}")]
    UnknownPaper { paper_id: String },

    #[error("Insufficient input: need at least {required} items, got {actual}")]
    InsufficientInput { required: usize, actual: usize },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Collaborator errors, propagated without retry
    #[error("Generation service error: {message}")]
    GenerationService { message: String },

    #[error("Embedding service error: {message}")]
    Embedding { message: String },

    #[error("Extraction failed for {path}: {message}")]
    Extraction { path: String, message: String },

    #[error("Paper discovery error: {message}")]
    Discovery { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for an [`AppError::EmptyInput`] naming the operation
    pub fn empty_input(operation: impl Into<String>) -> Self {
        AppError::EmptyInput {
            operation: operation.into(),
        }
    }

    /// Shorthand for an [`AppError::UnknownPaper`]
    pub fn unknown_paper(paper_id: impl Into<String>) -> Self {
        AppError::UnknownPaper {
            paper_id: paper_id.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::EmptyInput { .. } => ErrorCode::EmptyInput,
            AppError::UnknownPaper { .. } => ErrorCode::UnknownPaper,
            AppError::InsufficientInput { .. } => ErrorCode::InsufficientInput,
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::GenerationService { .. } => ErrorCode::GenerationServiceError,
            AppError::Embedding { .. } => ErrorCode::EmbeddingError,
            AppError::Extraction { .. } => ErrorCode::ExtractionError,
            AppError::Discovery { .. } => ErrorCode::DiscoveryError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Caller-contract violations: retrying the same call cannot succeed
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            AppError::EmptyInput { .. }
                | AppError::UnknownPaper { .. }
                | AppError::InsufficientInput { .. }
                | AppError::Validation { .. }
        )
    }

    /// Failures raised by an external collaborator (model, index, network)
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            AppError::GenerationService { .. }
                | AppError::Embedding { .. }
                | AppError::Extraction { .. }
                | AppError::Discovery { .. }
                | AppError::HttpClient(_)
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
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
        let err = AppError::unknown_paper("2401.00001");
        assert_eq!(err.code(), ErrorCode::UnknownPaper);
        assert_eq!(err.code().as_code(), 4001);
        assert!(err.to_string().contains("2401.00001"));
    }

    #[test]
    fn test_caller_errors() {
        let err = AppError::InsufficientInput {
            required: 2,
            actual: 1,
        };
        assert!(err.is_caller_error());
        assert!(!err.is_upstream_error());
        assert_eq!(err.to_string(), "Insufficient input: need at least 2 items, got 1");
    }

    #[test]
    fn test_upstream_error() {
        let err = AppError::GenerationService {
            message: "quota exceeded".into(),
        };
        assert!(err.is_upstream_error());
        assert!(!err.is_caller_error());
        assert_eq!(err.code(), ErrorCode::GenerationServiceError);
    }

    #[test]
    fn test_empty_input_names_operation() {
        let err = AppError::empty_input("chunking");
        assert_eq!(err.to_string(), "Empty input for chunking: nothing to process");
    }
}
