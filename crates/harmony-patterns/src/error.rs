//! Errors raised while loading, validating, or evaluating the pattern
//! catalogue.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pattern catalogue and evaluator registry.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A pattern file failed to parse as JSON.
    #[error("{path}: malformed pattern JSON: {reason}")]
    MalformedJson {
        /// Path of the offending file.
        path: PathBuf,
        /// The `serde_json` failure message.
        reason: String,
    },

    /// A pattern failed schema validation (missing/invalid fields).
    #[error("{path}: schema violation: {reason}")]
    SchemaViolation {
        /// Path of the offending file.
        path: PathBuf,
        /// Human-readable violation description.
        reason: String,
    },

    /// A pattern's file-name stem does not match its declared `family`, per
    /// the catalogue's path-naming convention (`<family>/<id>.json`).
    #[error("{path}: file path does not match declared family '{family}'")]
    PathNamingMismatch {
        /// Path of the offending file.
        path: PathBuf,
        /// The pattern's declared family.
        family: String,
    },

    /// Two patterns in the same catalogue declared the same id.
    #[error("duplicate pattern id '{id}' in {first_path} and {second_path}")]
    DuplicateId {
        /// The conflicting id.
        id: String,
        /// First file that declared this id.
        first_path: PathBuf,
        /// Second file that declared the same id.
        second_path: PathBuf,
    },

    /// The catalogue exceeded `ProcessingLimits::max_patterns`.
    #[error("catalogue exceeds the maximum of {max} patterns ({actual} found)")]
    CatalogueTooLarge {
        /// Configured maximum.
        max: u32,
        /// Actual number of patterns found.
        actual: usize,
    },

    /// A pattern named an evaluator not present in the registry.
    #[error("unknown evaluator '{name}' referenced by pattern '{pattern_id}'")]
    UnknownEvaluator {
        /// The evaluator name.
        name: String,
        /// The pattern that referenced it.
        pattern_id: String,
    },

    /// An I/O error occurred while reading the catalogue directory.
    #[error("I/O error reading pattern catalogue: {0}")]
    Io(String),
}

/// Result type used throughout `harmony-patterns`.
pub type PatternResult<T> = Result<T, PatternError>;
