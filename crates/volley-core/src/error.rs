use thiserror::Error;

use crate::scope::ScopeState;

/// Application-wide error types for Volley.
#[derive(Error, Debug)]
pub enum AppError {
    /// Credentials or settings are missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The URL or request could not be built.
    #[error("Failed to build request for {url}: {message}")]
    RequestBuildError { url: String, message: String },

    /// Connection failure or another transport-level error.
    #[error("Request to {url} failed: {message}")]
    TransportError { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    /// The execution scope expired or was cancelled while the request was in flight.
    #[error("Request to {url} aborted: scope {state}")]
    ScopeClosed { url: String, state: ScopeState },

    /// Response body could not be read or decoded into the expected shape.
    #[error("Failed to decode response from {url}: {message}")]
    DecodeError { url: String, message: String },

    /// The worker task for a URL panicked before reporting an outcome.
    #[error("Worker for {url} panicked: {message}")]
    WorkerPanicked { url: String, message: String },

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Coarse error taxonomy used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    RequestBuild,
    Transport,
    Decode,
    Internal,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ConfigError(_) => ErrorCategory::Config,
            AppError::RequestBuildError { .. } => ErrorCategory::RequestBuild,
            AppError::TransportError { .. }
            | AppError::HttpStatus { .. }
            | AppError::ScopeClosed { .. } => ErrorCategory::Transport,
            AppError::DecodeError { .. } | AppError::SerializationError(_) => {
                ErrorCategory::Decode
            }
            AppError::WorkerPanicked { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns true if the request was aborted by scope expiry or cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AppError::ScopeClosed { .. })
    }

    /// The endpoint this error refers to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            AppError::RequestBuildError { url, .. }
            | AppError::TransportError { url, .. }
            | AppError::HttpStatus { url, .. }
            | AppError::ScopeClosed { url, .. }
            | AppError::DecodeError { url, .. }
            | AppError::WorkerPanicked { url, .. } => Some(url),
            AppError::ConfigError(_) | AppError::SerializationError(_) => None,
        }
    }
}
