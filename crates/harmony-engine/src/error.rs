//! The top-level error type composing every layer the engine touches.

use thiserror::Error;

/// Errors raised anywhere in the matching/aggregation/calibration/arbitration
/// pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Failure while tokenizing input or building the analysis context.
    #[error(transparent)]
    Context(#[from] harmony_context::ContextError),

    /// Failure while loading or evaluating the pattern catalogue.
    #[error(transparent)]
    Pattern(#[from] harmony_patterns::PatternError),

    /// Failure while parsing/constructing a music-theory primitive.
    #[error(transparent)]
    ChordTheory(#[from] harmony_core::ChordTheoryError),

    /// The requested calibration mapping is unavailable for this track.
    #[error("no calibration mapping available for track '{track}'")]
    MissingCalibration {
        /// The track name.
        track: String,
    },
}

/// Result type used throughout `harmony-engine`.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Whether this error reflects a recoverable (soft) analytical
    /// condition, i.e. sparse/insufficient evidence rather than malformed
    /// input or configuration.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            AnalysisError::Context(e) => e.is_recoverable(),
            AnalysisError::ChordTheory(e) => e.is_recoverable(),
            AnalysisError::Pattern(_) | AnalysisError::MissingCalibration { .. } => false,
        }
    }
}
