//! Error types for two-point bundle operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by construction, lookup, and file codec operations
#[derive(Error, Debug)]
pub enum TwoPointError {
    /// Malformed in-memory construction (length mismatch, negative bin
    /// index, out-of-order grid edges)
    #[error("validation failed for `{field}`: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// Name lookup miss, or a required extension absent on read
    #[error("no {kind} named `{name}`")]
    NotFound { kind: &'static str, name: String },

    /// Duplicate name where uniqueness is required
    #[error("name `{name}` matches {count} {kind} records")]
    AmbiguousName {
        kind: &'static str,
        name: String,
        count: usize,
    },

    /// Optional feature requested but not supplied at construction
    #[error("{0} not supplied at construction")]
    NotAvailable(&'static str),

    /// Index outside a stored collection
    #[error("index {index} out of range for {what} ({len} entries)")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Structurally invalid file (bad magic, missing tag or column, wrong
    /// payload size)
    #[error("malformed file: {0}")]
    Format(String),

    /// Write collision without overwrite
    #[error("`{}` already exists and overwrite is disabled", .0.display())]
    AlreadyExists(PathBuf),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for two-point bundle operations
pub type Result<T> = std::result::Result<T, TwoPointError>;
