//! The pluggable evaluator registry: named scoring functions that turn a raw
//! pattern match into a probability-like score (§4.5).

use crate::error::{PatternError, PatternResult};
use dashmap::DashMap;
use harmony_core::Mode;

/// Features describing a single raw pattern match, passed to its evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchFeatures {
    /// Raw match strength in `[0, 1]` before evaluator shaping (e.g. the
    /// fraction of non-wildcard template slots that matched exactly).
    pub raw_strength: f64,
    /// The mode of the key the match occurred in, when known.
    pub mode: Option<Mode>,
}

/// A named scoring function: raw match features in, calibration-ready score
/// in `[0, 1]` out.
pub type EvaluatorFn = fn(&MatchFeatures) -> f64;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Passes the raw strength through unchanged (clamped to `[0, 1]`).
fn identity(features: &MatchFeatures) -> f64 {
    features.raw_strength.clamp(0.0, 1.0)
}

/// General-purpose logistic shaping, centered so a raw strength of 0.5 maps
/// close to 0.5 and extremes saturate towards 0/1.
fn logistic_default(features: &MatchFeatures) -> f64 {
    sigmoid(6.0 * (features.raw_strength - 0.5))
}

/// Logistic shaping biased toward Dorian contexts: boosts the score when the
/// match occurred in a Dorian key, otherwise behaves like the default curve.
fn logistic_dorian(features: &MatchFeatures) -> f64 {
    let bonus = if features.mode == Some(Mode::Dorian) { 0.1 } else { 0.0 };
    (sigmoid(6.0 * (features.raw_strength - 0.5)) + bonus).min(1.0)
}

/// Logistic shaping biased toward Mixolydian contexts.
fn logistic_mixolydian(features: &MatchFeatures) -> f64 {
    let bonus = if features.mode == Some(Mode::Mixolydian) { 0.1 } else { 0.0 };
    (sigmoid(6.0 * (features.raw_strength - 0.5)) + bonus).min(1.0)
}

/// Logistic shaping biased toward Phrygian contexts.
fn logistic_phrygian(features: &MatchFeatures) -> f64 {
    let bonus = if features.mode == Some(Mode::Phrygian) { 0.1 } else { 0.0 };
    (sigmoid(6.0 * (features.raw_strength - 0.5)) + bonus).min(1.0)
}

/// Concurrent registry of named evaluators, pre-populated with the built-in
/// curves and open to runtime registration of additional plugin evaluators.
#[derive(Debug)]
pub struct PluginRegistry {
    evaluators: DashMap<String, EvaluatorFn>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    /// A registry pre-populated with the built-in evaluators.
    #[must_use]
    pub fn new() -> Self {
        let evaluators = DashMap::new();
        evaluators.insert("identity".to_string(), identity as EvaluatorFn);
        evaluators.insert("logistic_default".to_string(), logistic_default as EvaluatorFn);
        evaluators.insert("logistic_dorian".to_string(), logistic_dorian as EvaluatorFn);
        evaluators.insert("logistic_mixolydian".to_string(), logistic_mixolydian as EvaluatorFn);
        evaluators.insert("logistic_phrygian".to_string(), logistic_phrygian as EvaluatorFn);
        Self { evaluators }
    }

    /// Register (or replace) a named evaluator.
    pub fn register(&self, name: impl Into<String>, evaluator: EvaluatorFn) {
        self.evaluators.insert(name.into(), evaluator);
    }

    /// Evaluate `features` using the evaluator named `name`.
    pub fn evaluate(&self, name: &str, pattern_id: &str, features: &MatchFeatures) -> PatternResult<f64> {
        let evaluator = self
            .evaluators
            .get(name)
            .ok_or_else(|| PatternError::UnknownEvaluator {
                name: name.to_string(),
                pattern_id: pattern_id.to_string(),
            })?;
        Ok(evaluator(features))
    }

    /// Whether an evaluator with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.evaluators.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_clamps() {
        let f = MatchFeatures { raw_strength: 1.4, mode: None };
        assert_eq!(identity(&f), 1.0);
    }

    #[test]
    fn test_logistic_default_monotonic() {
        let low = MatchFeatures { raw_strength: 0.2, mode: None };
        let high = MatchFeatures { raw_strength: 0.8, mode: None };
        assert!(logistic_default(&low) < logistic_default(&high));
    }

    #[test]
    fn test_dorian_bonus_applies_only_in_dorian() {
        let dorian = MatchFeatures { raw_strength: 0.5, mode: Some(Mode::Dorian) };
        let major = MatchFeatures { raw_strength: 0.5, mode: Some(Mode::Major) };
        assert!(logistic_dorian(&dorian) > logistic_dorian(&major));
    }

    #[test]
    fn test_registry_built_ins_present() {
        let registry = PluginRegistry::new();
        assert!(registry.contains("identity"));
        assert!(registry.contains("logistic_default"));
        assert!(registry.contains("logistic_dorian"));
        assert!(registry.contains("logistic_mixolydian"));
        assert!(registry.contains("logistic_phrygian"));
    }

    #[test]
    fn test_registry_unknown_evaluator_errors() {
        let registry = PluginRegistry::new();
        let f = MatchFeatures { raw_strength: 0.5, mode: None };
        let result = registry.evaluate("nonexistent", "pat1", &f);
        assert!(matches!(result, Err(PatternError::UnknownEvaluator { .. })));
    }

    #[test]
    fn test_registry_custom_registration() {
        let registry = PluginRegistry::new();
        registry.register("always_one", (|_f: &MatchFeatures| 1.0) as EvaluatorFn);
        let f = MatchFeatures { raw_strength: 0.0, mode: None };
        assert_eq!(registry.evaluate("always_one", "pat1", &f).unwrap(), 1.0);
    }
}
