//! Structured error output for machine callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::TrellisError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Database Errors (exit code 2) ===
    /// Database operation failed
    DatabaseError,
    /// Workspace not initialized
    NotInitialized,
    /// Already initialized
    AlreadyInitialized,

    // === Entity Errors (exit code 3) ===
    /// Entity with specified ID not found (or of another type)
    NotFound,
    /// Invalid formatted ID
    InvalidId,
    /// Parent reference of the wrong type
    InvalidParent,

    // === Validation Errors (exit code 4) ===
    /// Field validation failed
    ValidationFailed,

    // === Dependency Errors (exit code 5) ===
    /// Dependency target not found or not a task
    UnknownDependency,
    /// Cannot delete: has dependents
    HasDependents,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidId => "INVALID_ID",
            Self::InvalidParent => "INVALID_PARENT",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::UnknownDependency => "UNKNOWN_DEPENDENCY",
            Self::HasDependents => "HAS_DEPENDENTS",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable after fixing the input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed | Self::InvalidId | Self::InvalidParent | Self::UnknownDependency
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Database errors
    /// - 3: Entity errors
    /// - 4: Validation errors
    /// - 5: Dependency errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseError | Self::NotInitialized | Self::AlreadyInitialized => 2,
            Self::NotFound | Self::InvalidId | Self::InvalidParent => 3,
            Self::ValidationFailed => 4,
            Self::UnknownDependency | Self::HasDependents => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `TrellisError`.
    #[must_use]
    pub fn from_error(err: &TrellisError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);

        let message = match err {
            TrellisError::Other(inner) => format!("{inner:#}"),
            other => other.to_string(),
        };

        Self {
            code,
            message,
            hint: err.suggestion().map(str::to_string),
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &TrellisError) -> (ErrorCode, Option<Value>) {
        match err {
            TrellisError::NotFound { id } => (ErrorCode::NotFound, Some(json!({"id": id}))),
            TrellisError::InvalidParent {
                child,
                parent,
                expected,
            } => (
                ErrorCode::InvalidParent,
                Some(json!({"child": child, "parent": parent, "expected": expected})),
            ),
            TrellisError::UnknownDependency { id } => {
                (ErrorCode::UnknownDependency, Some(json!({"id": id})))
            }
            TrellisError::HasDependents { id, dependents } => (
                ErrorCode::HasDependents,
                Some(json!({"id": id, "dependents": dependents})),
            ),
            TrellisError::InvalidId { id } => (ErrorCode::InvalidId, Some(json!({"id": id}))),
            TrellisError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            TrellisError::ValidationErrors { errors } => (
                ErrorCode::ValidationFailed,
                Some(json!({
                    "errors": errors.iter()
                        .map(|e| json!({"field": e.field, "message": e.message}))
                        .collect::<Vec<_>>()
                })),
            ),
            TrellisError::Database(_) => (ErrorCode::DatabaseError, None),
            TrellisError::Config(_) => (ErrorCode::ConfigError, None),
            TrellisError::NotInitialized => (ErrorCode::NotInitialized, None),
            TrellisError::AlreadyInitialized { path } => (
                ErrorCode::AlreadyInitialized,
                Some(json!({"path": path.display().to_string()})),
            ),
            TrellisError::Io(_) => (ErrorCode::IoError, None),
            TrellisError::Json(_) => (ErrorCode::JsonError, None),
            TrellisError::Yaml(_) => (ErrorCode::YamlError, None),
            TrellisError::Other(inner) if inner.root_cause().is::<std::io::Error>() => {
                (ErrorCode::IoError, None)
            }
            TrellisError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}
