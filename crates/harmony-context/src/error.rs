//! Errors raised while tokenizing input or building an analysis context.

use thiserror::Error;

/// Errors raised while tokenizing input or inferring/building an
/// `AnalysisContext`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContextError {
    /// The input sequence was empty.
    #[error("input sequence is empty")]
    EmptyInput,

    /// The input sequence exceeded `ProcessingLimits::max_input_length`.
    #[error("input length {length} exceeds the maximum of {max}")]
    InputTooLong {
        /// Actual input length.
        length: usize,
        /// Configured maximum.
        max: usize,
    },

    /// No `key_hint` was supplied and no candidate key scored above the
    /// acceptance threshold.
    #[error("no key hint supplied and key inference did not reach the acceptance threshold (best score {best_score:.3})")]
    MissingKey {
        /// The highest-scoring candidate's score, for diagnostics.
        best_score: f64,
    },

    /// An element of the input could not be tokenized.
    #[error("could not tokenize element at position {position}: {reason}")]
    TokenizationFailure {
        /// Position of the offending element.
        position: usize,
        /// Human-readable failure reason.
        reason: String,
    },

    /// A lower-level chord-theory error occurred while building context.
    #[error(transparent)]
    ChordTheory(#[from] harmony_core::ChordTheoryError),
}

/// Result type used throughout `harmony-context`.
pub type ContextResult<T> = Result<T, ContextError>;

impl ContextError {
    /// Whether this error reflects a recoverable (soft) condition, i.e. one
    /// where the caller could retry with a supplied `key_hint`.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ContextError::MissingKey { .. })
    }
}
