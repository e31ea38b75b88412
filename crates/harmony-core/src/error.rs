//! Error types for music-theory primitives.

use thiserror::Error;

/// Errors raised while constructing or parsing chord-theory primitives.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChordTheoryError {
    /// An unrecognized note-name token was encountered.
    #[error("Invalid note name: '{token}' at position {position}")]
    InvalidNoteName {
        /// The offending token.
        token: String,
        /// Character offset of the token in the source string.
        position: usize,
    },

    /// A chord symbol could not be parsed.
    #[error("Invalid chord symbol: '{symbol}' ({reason})")]
    InvalidChordSymbol {
        /// The offending chord symbol.
        symbol: String,
        /// Human-readable parse failure reason.
        reason: String,
    },

    /// A Roman numeral could not be parsed.
    #[error("Invalid Roman numeral: '{symbol}' ({reason})")]
    InvalidRoman {
        /// The offending Roman-numeral symbol.
        symbol: String,
        /// Human-readable parse failure reason.
        reason: String,
    },

    /// Scale degree out of the valid 1-7 range.
    #[error("Scale degree out of range: {degree}. Must be 1-7")]
    ScaleDegreeOutOfRange {
        /// The offending degree.
        degree: u8,
    },

    /// An alteration string is not one of the recognized alterations.
    #[error("Invalid alteration: {alteration}. Must be one of [#5, b5, #9, b9, #11, b13]")]
    InvalidAlteration {
        /// The offending alteration token.
        alteration: String,
    },

    /// Two alterations conflict (e.g. both `#5` and `b5`).
    #[error("Incompatible chord alterations: {alterations:?}")]
    IncompatibleAlterations {
        /// The conflicting alteration tokens.
        alterations: Vec<String>,
    },

    /// A figured-bass inversion was requested that the chord cannot support.
    #[error("Invalid inversion {inversion} for a chord with {tone_count} tones")]
    InvalidInversion {
        /// The requested inversion index.
        inversion: u8,
        /// Number of tones the chord actually has.
        tone_count: usize,
    },

    /// A Roman numeral round-trip could not reconstruct the original chord.
    #[error("Roman numeral '{roman}' does not round-trip to chord in key {key}: {reason}")]
    RoundTripFailure {
        /// The Roman numeral symbol.
        roman: String,
        /// The key the round-trip was attempted in.
        key: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// A scale/key mismatch: supplied notes are not a subset of the implied scale.
    #[error("Notes do not fit key/scale: {reason}")]
    KeyScaleMismatch {
        /// Human-readable mismatch reason.
        reason: String,
    },
}

/// Result type used throughout `harmony-core`.
pub type ChordTheoryResult<T> = Result<T, ChordTheoryError>;

impl ChordTheoryError {
    /// Whether this error reflects a recoverable (soft) condition versus a
    /// hard structural violation.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChordTheoryError::KeyScaleMismatch { .. } | ChordTheoryError::RoundTripFailure { .. }
        )
    }
}
