//! Error types and handling for `trellis`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Core failures (`NotFound`, `InvalidParent`, `UnknownDependency`,
//!   `HasDependents`) are explicit variants; callers translate them
//! - Supports `anyhow` integration at the edges
//! - Provides structured JSON output for the CLI

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `trellis` operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    // === Core Errors ===
    /// Referenced entity does not exist, or is not of the expected type.
    #[error("Not found: {id}")]
    NotFound { id: String },

    /// Parent reference points at an entity of the wrong type.
    #[error("Invalid parent for {child}: {parent} must be {expected}")]
    InvalidParent {
        child: String,
        parent: String,
        expected: String,
    },

    /// A dependency id does not resolve to an existing task-type entity.
    #[error("Unknown dependency: {id}")]
    UnknownDependency { id: String },

    /// Cannot delete a task that other tasks depend on.
    #[error("Cannot delete {id}: depended on by {}", .dependents.join(", "))]
    HasDependents { id: String, dependents: Vec<String> },

    /// Formatted ID could not be parsed.
    #[error("Invalid ID format: {id}")]
    InvalidId { id: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {errors:?}")]
    ValidationErrors { errors: Vec<ValidationError> },

    // === Storage Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace not initialized.
    #[error("Trellis not initialized: run 'trellis init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The reason for the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl TrellisError {
    /// Shorthand for a `NotFound` on a formatted or numeric id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::NotFound { .. }
                | Self::InvalidParent { .. }
                | Self::UnknownDependency { .. }
                | Self::InvalidId { .. }
                | Self::Validation { .. }
                | Self::ValidationErrors { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: trellis init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::HasDependents { .. } => {
                Some("Remove the dependency from the dependent tasks first")
            }
            Self::InvalidParent { .. } => {
                Some("Epics belong to ideas; tasks, bugs and research items belong to epics")
            }
            Self::UnknownDependency { .. } => {
                Some("Dependencies must reference existing task, bug or research items")
            }
            Self::InvalidId { .. } => Some("IDs look like IDEA-1, EPIC-2, TSK-3, BUG-4 or RND-5"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create from multiple validation errors.
    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }
}

/// Result type using `TrellisError`.
pub type Result<T> = std::result::Result<T, TrellisError>;
