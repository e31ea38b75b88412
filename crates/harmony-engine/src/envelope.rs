//! The `AnalysisEngine`: holds the hot-swappable pattern catalogue,
//! evaluator registry, and per-track calibration mappings, and exposes the
//! top-level `analyze()` entry point (§4.1, §4.11).

use crate::aggregator::{self, ConflictResolution, TrackEvidence};
use crate::arbitration::{self, ArbitrationResult};
use crate::calibrator::CalibrationMapping;
use crate::error::AnalysisResult;
use crate::glossary::glossary_entry;
use crate::matcher::{self, PatternMatch};
use harmony_config::{ArbitrationParameters, AggregationParameters, ProcessingLimits, AGGREGATION, ARBITRATION, PROCESSING};
use harmony_context::{build_context, AnalysisContext, InputKind};
use harmony_core::Key;
use harmony_patterns::{PatternCatalogue, PluginRegistry, Track};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One matched pattern as surfaced to a caller: enough to render a citation
/// without exposing the internal `PatternMatch` representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCitation {
    /// The pattern's id.
    pub pattern_id: String,
    /// The pattern's family.
    pub family: String,
    /// Human-readable explanation, drawn from the glossary or the pattern's
    /// own description.
    pub explanation: String,
    /// The match's post-aggregation score in `[0, 1]` (before the track-level
    /// calibration applied to `Interpretation::score`).
    pub score: f64,
    /// Start index (inclusive) in the token sequence.
    pub start: usize,
    /// End index (exclusive) in the token sequence.
    pub end: usize,
    /// For `cadence`-family patterns, whether this match lands at the very
    /// end of the input (`"final"`) or mid-phrase (`"internal"`). `None` for
    /// non-cadential patterns.
    pub cadence_role: Option<String>,
    /// Whether this match's span reaches the end of the input, i.e. it
    /// closes the analyzed section. `None` for non-cadential patterns.
    pub is_section_closure: Option<bool>,
}

/// One track's calibrated interpretation, with the citations supporting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// The analytical track.
    pub track: Track,
    /// The calibrated confidence score in `[0, 1]`.
    pub score: f64,
    /// The patterns whose evidence contributed to this track.
    pub citations: Vec<PatternCitation>,
}

/// The complete result of an `analyze()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEnvelope {
    /// The key center used for this analysis.
    pub key: Key,
    /// Whether `key` was inferred rather than supplied.
    pub key_inferred: bool,
    /// The key-inference confidence (1.0 when supplied as a hint).
    pub key_confidence: f64,
    /// The chosen primary interpretation.
    pub primary: Interpretation,
    /// Other interpretations within the confidence threshold of the primary.
    pub alternatives: Vec<Interpretation>,
    /// The full normalized analysis context this envelope was built from,
    /// carried through so downstream projections (scale/melody summaries,
    /// Roman-numeral rendering) don't need to re-tokenize the input.
    pub context: AnalysisContext,
    /// Number of input tokens analyzed.
    pub tokens_analyzed: usize,
}

fn explain(catalogue: &PatternCatalogue, pattern_id: &str, family: &str) -> String {
    catalogue
        .get(pattern_id)
        .map(|p| p.description.clone())
        .filter(|d| !d.is_empty())
        .or_else(|| glossary_entry(family).map(ToString::to_string))
        .unwrap_or_else(|| format!("pattern '{pattern_id}' ({family})"))
}

fn to_interpretation(evidence: TrackEvidence, catalogue: &PatternCatalogue, total_tokens: usize) -> Interpretation {
    let citations = evidence
        .contributing
        .iter()
        .map(|m: &PatternMatch| {
            let is_cadence = m.family == "cadence";
            let is_closure = m.end == total_tokens;
            PatternCitation {
                pattern_id: m.pattern_id.clone(),
                family: m.family.clone(),
                explanation: explain(catalogue, &m.pattern_id, &m.family),
                score: m.score,
                start: m.start,
                end: m.end,
                cadence_role: is_cadence.then(|| if is_closure { "final".to_string() } else { "internal".to_string() }),
                is_section_closure: is_cadence.then_some(is_closure),
            }
        })
        .collect();
    Interpretation {
        track: evidence.track,
        score: evidence.combined_score,
        citations,
    }
}

/// The engine's tunable runtime configuration, exposed separately from the
/// hot-swappable catalogue/calibration state so callers can override
/// defaults without touching those locks.
#[derive(Debug, Clone, Copy)]
pub struct EngineParameters {
    /// Soft-NMS sigma and diversity bonus for evidence aggregation.
    pub aggregation: AggregationParameters,
    /// Confidence threshold, alternatives cap, and pop-profile override margin.
    pub arbitration: ArbitrationParameters,
    /// Window length, catalogue size, and input length limits.
    pub processing: ProcessingLimits,
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            aggregation: AGGREGATION,
            arbitration: ARBITRATION,
            processing: PROCESSING,
        }
    }
}

/// The engine: a hot-swappable pattern catalogue and calibration state
/// behind `RwLock<Arc<_>>`-style reference swaps, with no locking on the
/// per-request hot path beyond brief reads.
pub struct AnalysisEngine {
    catalogue: Arc<RwLock<PatternCatalogue>>,
    registry: Arc<PluginRegistry>,
    calibrations: Arc<RwLock<HashMap<Track, CalibrationMapping>>>,
    params: EngineParameters,
}

impl AnalysisEngine {
    /// Construct an engine around an already-loaded pattern catalogue, with
    /// the default evaluator registry, no calibration mappings (identity
    /// scoring throughout), and default tuning parameters.
    #[must_use]
    pub fn new(catalogue: PatternCatalogue) -> Self {
        Self {
            catalogue: Arc::new(RwLock::new(catalogue)),
            registry: Arc::new(PluginRegistry::new()),
            calibrations: Arc::new(RwLock::new(HashMap::new())),
            params: EngineParameters::default(),
        }
    }

    /// Construct an engine with explicit tuning parameters.
    #[must_use]
    pub fn with_params(catalogue: PatternCatalogue, params: EngineParameters) -> Self {
        let mut engine = Self::new(catalogue);
        engine.params = params;
        engine
    }

    /// Atomically replace the pattern catalogue. In-flight `analyze()` calls
    /// continue using the catalogue snapshot they already took a read lock
    /// on; new calls see the replacement immediately.
    pub fn reload_catalogue(&self, catalogue: PatternCatalogue) {
        *self.catalogue.write() = catalogue;
    }

    /// Install (or replace) the calibration mapping for a track.
    pub fn set_calibration(&self, track: Track, mapping: CalibrationMapping) {
        self.calibrations.write().insert(track, mapping);
    }

    /// Register a custom evaluator, available to any pattern that names it.
    pub fn register_evaluator(&self, name: impl Into<String>, evaluator: harmony_patterns::EvaluatorFn) {
        self.registry.register(name, evaluator);
    }

    /// Run the full pipeline: tokenize/build context, match patterns,
    /// aggregate evidence, calibrate, and arbitrate a primary interpretation.
    pub fn analyze(
        &self,
        input: InputKind,
        key_hint: Option<Key>,
        profile: &str,
        conflict: ConflictResolution,
    ) -> AnalysisResult<AnalysisEnvelope> {
        let ctx = build_context(input, key_hint)?;

        let catalogue = self.catalogue.read();
        let raw_matches = matcher::match_all(
            &ctx,
            &catalogue,
            &self.registry,
            profile,
            self.params.processing.max_window_length as usize,
        )?;

        let mut evidence = aggregator::aggregate(raw_matches, conflict, &self.params.aggregation);

        let calibrations = self.calibrations.read();
        for e in &mut evidence {
            if let Some(mapping) = calibrations.get(&e.track) {
                e.combined_score = mapping.method.apply(e.combined_score);
            }
        }
        drop(calibrations);

        let ArbitrationResult { primary, alternatives } =
            arbitration::choose_primary(evidence, profile, &self.params.arbitration);

        let total_tokens = ctx.tokens.len();
        let envelope = AnalysisEnvelope {
            key: ctx.key,
            key_inferred: ctx.key_inferred,
            key_confidence: ctx.key_confidence,
            primary: to_interpretation(primary, &catalogue, total_tokens),
            alternatives: alternatives
                .into_iter()
                .map(|e| to_interpretation(e, &catalogue, total_tokens))
                .collect(),
            tokens_analyzed: total_tokens,
            context: ctx,
        };

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_patterns::Pattern;
    use std::collections::HashMap as StdHashMap;
    use std::path::PathBuf;

    fn cadence_pattern() -> Pattern {
        Pattern {
            id: "auth_cadence".to_string(),
            name: "Authentic cadence".to_string(),
            family: "cadence".to_string(),
            track: Track::Functional,
            sequence: vec!["V".to_string(), "I".to_string()],
            base_score: 0.9,
            evaluator: "identity".to_string(),
            profile_weights: StdHashMap::new(),
            description: "Dominant resolving to tonic".to_string(),
        }
    }

    #[test]
    fn test_analyze_finds_authentic_cadence() {
        let mut catalogue = PatternCatalogue::empty();
        catalogue.insert(cadence_pattern(), PathBuf::from("cadence/auth_cadence.json")).unwrap();
        let engine = AnalysisEngine::new(catalogue);

        let input = InputKind::ChordSymbols(vec!["C".to_string(), "G".to_string(), "C".to_string()]);
        let key = Key::new(harmony_core::PitchClass::new(0), harmony_core::Mode::Major);
        let envelope = engine.analyze(input, Some(key), "classical", ConflictResolution::SoftNms).unwrap();

        assert_eq!(envelope.primary.track, Track::Functional);
        assert!(!envelope.primary.citations.is_empty());
    }

    #[test]
    fn test_analyze_with_no_matches_is_a_well_formed_zero_confidence_envelope() {
        let catalogue = PatternCatalogue::empty();
        let engine = AnalysisEngine::new(catalogue);
        let input = InputKind::ChordSymbols(vec!["C".to_string()]);
        let key = Key::new(harmony_core::PitchClass::new(0), harmony_core::Mode::Major);
        let envelope = engine.analyze(input, Some(key), "classical", ConflictResolution::SoftNms).unwrap();
        assert!((envelope.primary.score - 0.0).abs() < 1e-9);
        assert!(envelope.primary.citations.is_empty());
        assert!(envelope.alternatives.is_empty());
    }

    #[test]
    fn test_reload_catalogue_is_visible_to_next_call() {
        let engine = AnalysisEngine::new(PatternCatalogue::empty());
        let mut catalogue = PatternCatalogue::empty();
        catalogue.insert(cadence_pattern(), PathBuf::from("cadence/auth_cadence.json")).unwrap();
        engine.reload_catalogue(catalogue);

        let input = InputKind::ChordSymbols(vec!["C".to_string(), "G".to_string(), "C".to_string()]);
        let key = Key::new(harmony_core::PitchClass::new(0), harmony_core::Mode::Major);
        let envelope = engine.analyze(input, Some(key), "classical", ConflictResolution::SoftNms).unwrap();
        assert_eq!(envelope.primary.track, Track::Functional);
    }
}
