//! Error types for recipe operations.
//!
//! This module defines [`RecipeError`], the primary error type used throughout
//! the crate, a [`Result`] type alias for convenience, and the two error
//! families that the runner recovers from locally:
//!
//! - [`ConditionError`] - a step guard could not be evaluated (step is skipped)
//! - [`BackendError`] - an execution backend failed (step fails, run stops)
//!
//! # Error Handling Strategy
//!
//! - Use `RecipeError` for parse-time and loading errors surfaced to callers
//! - Use `anyhow::Error` (via `RecipeError::Other`) for unexpected errors
//! - All errors should name the step or field they concern

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Core error type for recipe loading and parsing.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// The document is not a YAML mapping or is structurally unusable.
    #[error("Malformed recipe document: {message}")]
    MalformedDocument { message: String },

    /// A required field is absent or empty.
    #[error("Missing required field '{field}' in {location}")]
    MissingField { field: String, location: String },

    /// Two steps share the same id.
    #[error("Duplicate step id: {id}")]
    DuplicateStepId { id: String },

    /// A known field has a value of the wrong shape.
    #[error("Invalid value for '{field}' in {location}: {message}")]
    InvalidField {
        field: String,
        location: String,
        message: String,
    },

    /// Recipe file does not exist.
    #[error("Recipe not found: {path}")]
    RecipeNotFound { path: PathBuf },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for recipe operations.
pub type Result<T> = std::result::Result<T, RecipeError>;

/// Failure to evaluate a step condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    /// The expression uses a construct outside the allowed set.
    #[error("Unsafe expression '{expression}': {reason}")]
    UnsafeExpression { expression: String, reason: String },

    /// The expression could not be parsed.
    #[error("Invalid syntax in '{expression}': {message}")]
    InvalidSyntax { expression: String, message: String },

    /// A bare name is not bound in the context.
    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    /// Attribute access on a mapping without that key, or on a non-mapping.
    #[error("No attribute '{attribute}' on {target}")]
    MissingAttribute { attribute: String, target: String },

    /// Operands cannot be compared with the requested operator.
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },
}

/// Failure reported by an execution backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Command exited unsuccessfully.
    #[error("Command failed with exit code {code:?}: {command}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Command did not finish within its timeout and was killed.
    #[error("Command timed out after {}s: {command}", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    /// The process could not be started.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Agent invocation reported an error.
    #[error("Agent '{agent}' failed: {message}")]
    AgentFailed { agent: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{}", trimmed)
    }
}
