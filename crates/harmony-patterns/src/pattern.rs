//! The `Pattern` record: a declarative template plus the evidence weight and
//! evaluator to apply when it matches (§4.4, §4.5).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which analytical track a pattern contributes evidence to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Common-practice functional harmony (cadences, secondary dominants).
    Functional,
    /// Modal-borrowing and church-mode evidence.
    Modal,
    /// Chromatic mediants, tritone substitutions, and other color harmony.
    Chromatic,
}

/// A declarative harmonic pattern: a Roman-numeral sequence template, the
/// track it feeds, and the evaluator used to turn a raw match into a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Globally unique pattern id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// The pattern family, used for catalogue organization and the
    /// path-naming convention (`<family>/<id>.json`).
    pub family: String,
    /// The analytical track this pattern's evidence feeds.
    pub track: Track,
    /// Roman-numeral sequence template. A token of `"*"` matches any single
    /// numeral at that position (a wildcard slot).
    pub sequence: Vec<String>,
    /// Base evidence weight in `[0, 1]` before calibration.
    pub base_score: f64,
    /// Name of the registered `EvaluatorFn` used to score a raw match.
    pub evaluator: String,
    /// Per-style-profile score multipliers (e.g. `{"jazz": 1.2, "classical": 0.8}`).
    #[serde(default)]
    pub profile_weights: HashMap<String, f64>,
    /// Free-text description surfaced in the result envelope's glossary.
    #[serde(default)]
    pub description: String,
}

impl Pattern {
    /// Window length (in sequence positions) this pattern spans.
    #[must_use]
    pub fn window_length(&self) -> usize {
        self.sequence.len()
    }

    /// Validate structural invariants beyond what `serde` already enforces:
    /// non-empty id/sequence, score within range, and a non-empty evaluator
    /// name.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("pattern id must not be empty".to_string());
        }
        if self.sequence.is_empty() {
            return Err("pattern sequence must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.base_score) {
            return Err(format!("base_score {} is out of [0, 1]", self.base_score));
        }
        if self.evaluator.trim().is_empty() {
            return Err("evaluator name must not be empty".to_string());
        }
        Ok(())
    }

    /// The effective score multiplier for a given style profile, defaulting
    /// to 1.0 when the pattern declares no override for it.
    #[must_use]
    pub fn profile_weight(&self, profile: &str) -> f64 {
        self.profile_weights.get(profile).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Pattern {
        Pattern {
            id: "authentic_cadence".to_string(),
            name: "Authentic cadence".to_string(),
            family: "cadence".to_string(),
            track: Track::Functional,
            sequence: vec!["V".to_string(), "I".to_string()],
            base_score: 0.8,
            evaluator: "logistic_default".to_string(),
            profile_weights: HashMap::new(),
            description: "Dominant resolving to tonic".to_string(),
        }
    }

    #[test]
    fn test_window_length() {
        assert_eq!(sample().window_length(), 2);
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_score() {
        let mut p = sample();
        p.base_score = 1.5;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_profile_weight_default() {
        assert_eq!(sample().profile_weight("jazz"), 1.0);
    }
}
