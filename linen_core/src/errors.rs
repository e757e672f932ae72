//! # Error Types
//!
//! Structured error types for linen_core. The calculation engine itself never
//! fails (malformed numbers are absorbed by [`crate::sanitize`]), so these
//! errors only surface at the edges: workbook lookups, storage, file I/O and
//! exports.
//!
//! ## Example
//!
//! ```rust
//! use linen_core::errors::{LinenError, LinenResult};
//!
//! fn require_name(name: &str) -> LinenResult<()> {
//!     if name.trim().is_empty() {
//!         return Err(LinenError::invalid_input("name", name, "Name must not be blank"));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for linen_core operations
pub type LinenResult<T> = Result<T, LinenError>;

/// Structured error type for everything outside the pure engine.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum LinenError {
    /// An input value is invalid and cannot be sanitized into shape
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A referenced record (property, scenario, history entry) does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// An export renderer (CSV, PDF) failed
    #[error("Export failed: {format} - {reason}")]
    ExportFailed { format: String, reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LinenError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        LinenError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        LinenError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        LinenError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        LinenError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create an ExportFailed error
    pub fn export_failed(format: impl Into<String>, reason: impl Into<String>) -> Self {
        LinenError::ExportFailed {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LinenError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            LinenError::InvalidInput { .. } => "INVALID_INPUT",
            LinenError::NotFound { .. } => "NOT_FOUND",
            LinenError::FileError { .. } => "FILE_ERROR",
            LinenError::FileLocked { .. } => "FILE_LOCKED",
            LinenError::SerializationError { .. } => "SERIALIZATION_ERROR",
            LinenError::VersionMismatch { .. } => "VERSION_MISMATCH",
            LinenError::ExportFailed { .. } => "EXPORT_FAILED",
            LinenError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for LinenError {
    fn from(e: serde_json::Error) -> Self {
        LinenError::SerializationError { reason: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = LinenError::not_found("Scenario", "1712345678");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"NotFound\""));
        let roundtrip: LinenError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(LinenError::not_found("Property", "7").error_code(), "NOT_FOUND");
        assert_eq!(LinenError::export_failed("pdf", "boom").error_code(), "EXPORT_FAILED");
        assert!(LinenError::file_locked("a.linen", "sam", "now").is_recoverable());
        assert!(!LinenError::invalid_input("name", "", "blank").is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let error = LinenError::not_found("History record", "abc");
        assert_eq!(error.to_string(), "History record not found: abc");
    }
}
