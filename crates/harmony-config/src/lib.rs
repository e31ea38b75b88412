//! Configuration constants and tunable parameters for the harmonic analysis engine.
//!
//! This crate provides every numeric constant the rest of the workspace needs so
//! that tuning knobs live in one place instead of being scattered through the
//! pipeline as magic numbers. Everything here is a plain `const`/`static` value
//! plus a `Validate` trait that catches self-inconsistent configuration early.

use serde::{Deserialize, Serialize};

/// Core music-theory constants (pitch-class arithmetic, scale degrees).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicalConstants {
    /// Number of diatonic scale degrees (always 7).
    pub scale_degrees: u8,
    /// Number of chromatic pitch classes in an octave (always 12).
    pub chromatic_notes: u8,
    /// MIDI note number of middle C, used when rendering melody octaves.
    pub middle_c_midi: u8,
    /// Default octave assumed when a melody note omits one.
    pub default_octave: u8,
    /// Maximum figured-bass inversion index supported (0=root .. 3=third inversion).
    pub max_inversions: u8,
}

/// Default musical constants.
pub const MUSICAL: MusicalConstants = MusicalConstants {
    scale_degrees: 7,
    chromatic_notes: 12,
    middle_c_midi: 60,
    default_octave: 4,
    max_inversions: 3,
};

/// Key-inference tuning (analysis-context builder, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyInferenceParameters {
    /// Minimum inference score required to accept an inferred key instead of
    /// raising `MissingKeyError` when chord input omits `key_hint`.
    pub acceptance_threshold: f64,
    /// Bonus added when the tonic chord occurs as the first chord.
    pub first_chord_tonic_bonus: f64,
    /// Bonus added when the tonic chord occurs as the last chord.
    pub last_chord_tonic_bonus: f64,
    /// Penalty subtracted per chord that is not diatonic to the candidate key.
    pub non_diatonic_penalty: f64,
    /// Margin below which the engine prefers an explicit key hint over a
    /// close-scoring inferred candidate (§9 open question, resolved).
    pub hint_preference_margin: f64,
}

/// Default key-inference parameters.
pub const KEY_INFERENCE: KeyInferenceParameters = KeyInferenceParameters {
    acceptance_threshold: 0.55,
    first_chord_tonic_bonus: 0.15,
    last_chord_tonic_bonus: 0.2,
    non_diatonic_penalty: 0.12,
    hint_preference_margin: 0.08,
};

/// Aggregation tuning (conflict resolution and diversity bonus, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationParameters {
    /// Soft-NMS decay constant σ in `exp(-overlap_fraction / sigma)`.
    pub soft_nms_sigma: f64,
    /// Bonus added when evidence spans two or more distinct pattern families.
    pub diversity_bonus: f64,
}

/// Default aggregation parameters.
pub const AGGREGATION: AggregationParameters = AggregationParameters {
    soft_nms_sigma: 0.5,
    diversity_bonus: 0.05,
};

/// Calibration quality gates (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationGates {
    /// Minimum sample count to admit a fitted mapping.
    pub min_sample_count: usize,
    /// Minimum target variance to admit a fitted mapping.
    pub min_target_variance: f64,
    /// Minimum absolute correlation between raw score and target.
    pub min_abs_correlation: f64,
    /// Maximum allowed ECE regression after fitting.
    pub max_ece_regression: f64,
    /// Fraction of bins allowed to violate monotonicity for isotonic fits.
    pub max_monotonicity_violation_fraction: f64,
    /// Number of equal-width bins used when computing ECE.
    pub ece_bins: usize,
}

/// Default calibration gates.
pub const CALIBRATION_GATES: CalibrationGates = CalibrationGates {
    min_sample_count: 50,
    min_target_variance: 0.01,
    min_abs_correlation: 0.1,
    max_ece_regression: 0.05,
    max_monotonicity_violation_fraction: 0.10,
    ece_bins: 10,
};

/// Arbitration & envelope tuning (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationParameters {
    /// A track within this margin of the primary's calibrated score becomes
    /// an alternative.
    pub confidence_threshold: f64,
    /// Maximum number of alternative interpretations returned.
    pub max_alternatives: usize,
    /// Margin by which modal evidence must exceed functional evidence under
    /// the `pop` profile before modal is preferred as primary.
    pub pop_modal_override_margin: f64,
}

/// Default arbitration parameters.
pub const ARBITRATION: ArbitrationParameters = ArbitrationParameters {
    confidence_threshold: 0.15,
    max_alternatives: 3,
    pop_modal_override_margin: 0.2,
};

/// Processing limits (catalogue size, window length, batching).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingLimits {
    /// Maximum window length (in chords/notes) any single pattern may declare.
    pub max_window_length: u8,
    /// Maximum number of patterns a single catalogue may hold.
    pub max_patterns: u32,
    /// Maximum input length (chords/romans/notes/melody) accepted per request.
    pub max_input_length: u16,
}

/// Default processing limits.
pub const PROCESSING: ProcessingLimits = ProcessingLimits {
    max_window_length: 20,
    max_patterns: 10_000,
    max_input_length: 512,
};

/// Performance budgets, in milliseconds, used by the engine's own internal
/// instrumentation (not enforced as hard timeouts — see spec §5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    /// Expected upper bound for a single `analyze()` call on typical input.
    pub analysis_target_ms: u32,
    /// Expected upper bound for a pattern-catalogue (re)load.
    pub catalogue_load_target_ms: u32,
}

/// Default performance thresholds.
pub const PERFORMANCE: PerformanceThresholds = PerformanceThresholds {
    analysis_target_ms: 200,
    catalogue_load_target_ms: 50,
};

/// Error type for configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A field holds a structurally invalid value.
    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue {
        /// Name of the offending field.
        field: String,
        /// String rendering of the offending value.
        value: String,
    },
    /// A field's value falls outside its permitted range.
    #[error("Configuration value out of range: {field} must be between {min} and {max}")]
    OutOfRange {
        /// Name of the offending field.
        field: String,
        /// Lower bound, rendered.
        min: String,
        /// Upper bound, rendered.
        max: String,
    },
}

/// Validation trait implemented by every configuration structure.
pub trait Validate {
    /// Validate the configuration values, returning the first violation found.
    fn validate(&self) -> Result<(), ConfigError>;
}

impl Validate for MusicalConstants {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.scale_degrees == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scale_degrees".to_string(),
                value: "0".to_string(),
            });
        }
        if self.chromatic_notes != 12 {
            return Err(ConfigError::InvalidValue {
                field: "chromatic_notes".to_string(),
                value: self.chromatic_notes.to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for CalibrationGates {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_sample_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_sample_count".to_string(),
                value: "0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_abs_correlation) {
            return Err(ConfigError::OutOfRange {
                field: "min_abs_correlation".to_string(),
                min: "0.0".to_string(),
                max: "1.0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.max_monotonicity_violation_fraction) {
            return Err(ConfigError::OutOfRange {
                field: "max_monotonicity_violation_fraction".to_string(),
                min: "0.0".to_string(),
                max: "1.0".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for AggregationParameters {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.soft_nms_sigma <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "soft_nms_sigma".to_string(),
                min: "0.0 (exclusive)".to_string(),
                max: "inf".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.diversity_bonus) {
            return Err(ConfigError::OutOfRange {
                field: "diversity_bonus".to_string(),
                min: "0.0".to_string(),
                max: "1.0".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for ArbitrationParameters {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "confidence_threshold".to_string(),
                min: "0.0".to_string(),
                max: "1.0".to_string(),
            });
        }
        if self.max_alternatives == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_alternatives".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
