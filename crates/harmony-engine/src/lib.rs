//! Pattern matching, evidence aggregation, calibration, and arbitration: the
//! analytical core of the harmonic analysis engine.

pub mod aggregator;
pub mod arbitration;
pub mod calibrator;
pub mod envelope;
pub mod error;
pub mod glossary;
pub mod matcher;
pub mod target_builder;

pub use aggregator::{aggregate, ConflictResolution, TrackEvidence};
pub use arbitration::{choose_primary, ArbitrationResult};
pub use calibrator::{fit_calibration, CalibrationMapping, CalibrationMethod, CalibrationMethodKind};
pub use envelope::{AnalysisEngine, AnalysisEnvelope, EngineParameters, Interpretation, PatternCitation};
pub use error::{AnalysisError, AnalysisResult};
pub use glossary::{glossary_entry, FEATURE_GLOSSARY};
pub use matcher::{greedy_non_overlap, match_all, observed_sequence, PatternMatch};
pub use target_builder::{adjudicate, build_training_set, Adjudication, AnnotatedSample, DifficultyBucket};
