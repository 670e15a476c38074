//! # Error Types
//!
//! Structured error types for lam_core. These errors are designed to be
//! informative for both humans and programs, providing enough context to
//! understand and fix issues programmatically.
//!
//! Two families exist:
//!
//! - [`LamError`] - caller-visible failures of an analysis (bad geometry
//!   string, bad configuration, physically indeterminate setup).
//! - [`ModelError`] - anything that goes wrong *inside* a pluggable theory
//!   model during the handshake. These never abort an analysis; the
//!   handshake recovers by rolling back to the unmodeled table (see
//!   `theories::handshake`).
//!
//! ## Example
//!
//! ```rust
//! use lam_core::errors::{LamError, LamResult};
//!
//! fn validate_points(p: usize) -> LamResult<()> {
//!     if p == 0 {
//!         return Err(LamError::validation("p", "points per layer must be at least 1"));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for lam_core operations
pub type LamResult<T> = Result<T, LamError>;

/// Structured error type for laminate analysis operations.
///
/// Each variant provides specific context about what went wrong,
/// enabling programmatic error handling by downstream consumers.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum LamError {
    /// A geometry string could not be parsed
    #[error("Cannot parse geometry '{input}': {reason}")]
    GeometryParse { input: String, reason: String },

    /// The configuration bundle is malformed or incomplete
    #[error("Invalid configuration for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A physically ambiguous configuration that must not default silently
    #[error("Indeterminate configuration: {reason} ({guidance})")]
    Indeterminate { reason: String, guidance: String },

    /// An error reported by a pluggable theory model.
    ///
    /// Carried for reporting only: the handshake recovers from model
    /// errors locally and never propagates them as analysis failures.
    #[error("Model error: {0}")]
    Model(ModelError),
}

impl LamError {
    /// Create a GeometryParse error
    pub fn geometry_parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        LamError::GeometryParse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a Validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        LamError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an Indeterminate error
    pub fn indeterminate(reason: impl Into<String>, guidance: impl Into<String>) -> Self {
        LamError::Indeterminate {
            reason: reason.into(),
            guidance: guidance.into(),
        }
    }

    /// Check if this is a recoverable error.
    ///
    /// Model errors are recovered by the handshake rollback; everything
    /// else is fatal for the analysis that raised it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LamError::Model(_))
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            LamError::GeometryParse { .. } => "GEOMETRY_PARSE",
            LamError::Validation { .. } => "VALIDATION",
            LamError::Indeterminate { .. } => "INDETERMINATE",
            LamError::Model(_) => "MODEL",
        }
    }
}

impl From<ModelError> for LamError {
    fn from(err: ModelError) -> Self {
        LamError::Model(err)
    }
}

/// Errors raised inside (or at the boundary of) a pluggable theory model.
///
/// Model authors return the first four variants from their `apply`
/// implementation; `UnknownModel` and `ColumnMismatch` are raised by the
/// handshake itself. All of them trigger the same rollback path.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ModelError {
    /// A numeric operation is invalid (division by zero, log of a
    /// non-positive number, etc.)
    #[error("Numeric failure in {operation}: {reason}")]
    Numeric { operation: String, reason: String },

    /// A loading parameter is outside the model's valid domain
    #[error("Invalid loading parameter '{parameter}' = {value}: {reason}")]
    InvalidLoading {
        parameter: String,
        value: String,
        reason: String,
    },

    /// The laminate table contains values the model cannot resolve
    #[error("Indeterminate value: {reason}")]
    Indeterminate { reason: String },

    /// Catch-all for model-author domain errors
    #[error("Model failed: {reason}")]
    Failed { reason: String },

    /// The requested model identifier is not in the registry
    #[error("Unknown model: '{model}'")]
    UnknownModel { model: String },

    /// A model returned a column whose length disagrees with the table
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    ColumnMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl ModelError {
    /// Create a Numeric error
    pub fn numeric(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::Numeric {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidLoading error
    pub fn invalid_loading(
        parameter: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ModelError::InvalidLoading {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an Indeterminate error
    pub fn indeterminate(reason: impl Into<String>) -> Self {
        ModelError::Indeterminate {
            reason: reason.into(),
        }
    }

    /// Create a Failed error
    pub fn failed(reason: impl Into<String>) -> Self {
        ModelError::Failed {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::Numeric { .. } => "NUMERIC",
            ModelError::InvalidLoading { .. } => "INVALID_LOADING",
            ModelError::Indeterminate { .. } => "INDETERMINATE",
            ModelError::Failed { .. } => "FAILED",
            ModelError::UnknownModel { .. } => "UNKNOWN_MODEL",
            ModelError::ColumnMismatch { .. } => "COLUMN_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = LamError::geometry_parse("400-[x]-800", "thickness token is not a number");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: LamError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_model_error_serialization() {
        let error = ModelError::invalid_loading("r", "0", "r=0 is invalid for the log term");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: ModelError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LamError::validation("p", "must be at least 1").error_code(),
            "VALIDATION"
        );
        assert_eq!(
            LamError::indeterminate("single point", "use p >= 2").error_code(),
            "INDETERMINATE"
        );
        assert_eq!(
            ModelError::numeric("moment equation", "division by zero").error_code(),
            "NUMERIC"
        );
    }

    #[test]
    fn test_only_model_errors_recover() {
        assert!(LamError::from(ModelError::failed("anything")).is_recoverable());
        assert!(!LamError::geometry_parse("x", "bad").is_recoverable());
        assert!(!LamError::indeterminate("1-ply, p=1", "use p >= 2").is_recoverable());
    }

    #[test]
    fn test_display_carries_guidance() {
        let err = LamError::indeterminate("cannot assign a stress side", "use p >= 2");
        assert!(err.to_string().contains("use p >= 2"));
    }
}
