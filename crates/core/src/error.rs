//! Error types for the docpair domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use std::path::PathBuf;
use thiserror::Error;

// --- Bounded context errors ---

/// Failures of the hosted document/model service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by service, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Service not configured: {0}")]
    NotConfigured(String),
}

/// Failures scoped to a single document. None of these abort a cycle.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("Unknown document: {0}")]
    NotFound(String),

    #[error("Document {identifier} has no local file at {}", path.display())]
    MissingFile { identifier: String, path: PathBuf },

    #[error("Failed to read {}: {reason}", path.display())]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Upload of {identifier} failed after {attempts} attempts: {last_error}")]
    UploadExhausted {
        identifier: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Could not fetch remote file for {identifier}: {reason}")]
    RemoteLookupFailed { identifier: String, reason: String },
}

impl DocumentError {
    /// The document identifier this error concerns, when known.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::NotFound(id) => Some(id),
            Self::MissingFile { identifier, .. }
            | Self::UploadExhausted { identifier, .. }
            | Self::RemoteLookupFailed { identifier, .. } => Some(identifier),
            Self::ReadFailed { .. } => None,
        }
    }
}
