//! Error types for backlog tracing operations
//!
//! This module provides the error taxonomy for the backlog tracer:
//! - Structured error types with descriptive messages
//! - Stable error codes for programmatic handling
//! - Error categories for grouping and filtering
//! - JSON serialization for operator-facing responses
//!
//! Only a handful of these ever reach a caller. Capture failures are consumed
//! by the interceptor according to its [`CaptureFailurePolicy`], and using a
//! tracer after shutdown is a programming error that panics rather than
//! returning an error.
//!
//! [`CaptureFailurePolicy`]: crate::trace::CaptureFailurePolicy
//!
//! # Example
//!
//! ```rust
//! use backlog_core::error::{BacklogError, ErrorCategory};
//!
//! fn handle_error(err: BacklogError) {
//!     match err.category() {
//!         ErrorCategory::Validation => println!("Invalid input"),
//!         ErrorCategory::Processing => println!("A pipeline stage failed"),
//!         _ => println!("Other error"),
//!     }
//!
//!     println!("{}: {}", err.error_code(), err);
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for backlog operations
pub type Result<T> = std::result::Result<T, BacklogError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Input or configuration validation failed
    Validation,
    /// A message snapshot could not be taken
    Capture,
    /// A pipeline stage failed while processing an exchange
    Processing,
    /// Internal error
    Internal,
    /// External I/O or serialization error
    External,
}

/// Errors that can occur in backlog tracing operations
#[derive(Error, Debug)]
pub enum BacklogError {
    // ═══════════════════════════════════════════════════════════════════════
    // Configuration errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Per-node backlog size must be a positive number
    #[error("The backlog size must be a positive number, was: {size}")]
    InvalidBacklogSize { size: i64 },

    /// Tracer configuration is invalid
    #[error("Invalid tracer configuration: {reason}")]
    InvalidConfig { reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Capture and processing errors
    // ═══════════════════════════════════════════════════════════════════════

    /// The exchange state could not be snapshotted for the backlog
    #[error("Failed to capture message at node '{node_id}': {reason}")]
    CaptureFailed { node_id: String, reason: String },

    /// A processor failed while handling an exchange
    #[error("Processing failed at node '{node_id}': {reason}")]
    ProcessingFailed { node_id: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors (serialization, I/O)
    // ═══════════════════════════════════════════════════════════════════════

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("IO error: {message}")]
    IoError { message: String },

    /// Internal error that shouldn't happen
    #[error("Internal error: {reason}. This is a bug; please report it.")]
    InternalError { reason: String },
}

impl BacklogError {
    /// Returns true if this error might succeed on retry
    ///
    /// Nothing in the tracer performs transient work, so the only recoverable
    /// case is a processing failure, which belongs to the pipeline and may be
    /// redelivered by it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BacklogError::ProcessingFailed { .. })
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            BacklogError::InvalidBacklogSize { .. }
            | BacklogError::InvalidConfig { .. } => ErrorCategory::Validation,

            BacklogError::CaptureFailed { .. } => ErrorCategory::Capture,

            BacklogError::ProcessingFailed { .. } => ErrorCategory::Processing,

            BacklogError::InternalError { .. } => ErrorCategory::Internal,

            BacklogError::JsonError(_)
            | BacklogError::IoError { .. } => ErrorCategory::External,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            BacklogError::InvalidBacklogSize { .. } => "INVALID_BACKLOG_SIZE",
            BacklogError::InvalidConfig { .. } => "INVALID_CONFIG",
            BacklogError::CaptureFailed { .. } => "CAPTURE_FAILED",
            BacklogError::ProcessingFailed { .. } => "PROCESSING_FAILED",
            BacklogError::JsonError(_) => "JSON_ERROR",
            BacklogError::IoError { .. } => "IO_ERROR",
            BacklogError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    /// Converts this error to a JSON-serializable response object
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                recoverable: self.is_recoverable(),
            },
        }
    }
}

impl From<std::io::Error> for BacklogError {
    fn from(err: std::io::Error) -> Self {
        BacklogError::IoError {
            message: err.to_string(),
        }
    }
}

/// JSON-serializable error response for operator surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "INVALID_BACKLOG_SIZE")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Whether retry might succeed
    pub recoverable: bool,
}
