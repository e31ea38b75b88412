//! Offline calibration-target construction from human-annotated corpora
//! (§4.9). Not part of the online `analyze()` path; used to produce the
//! `(raw_score, target)` pairs that `calibrator::fit_calibration` consumes.

use harmony_patterns::Track;
use serde::{Deserialize, Serialize};

/// How difficult a human annotator judged a sample to be, used to decide how
/// much weight it carries in adjudication. The four strata are the
/// corpus-design buckets samples are drawn from, not a property the engine
/// infers at analysis time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyBucket {
    /// Unambiguous textbook cases: fully diatonic progressions.
    DiatonicSimple,
    /// Clear but requiring some harmonic-context reasoning: secondary
    /// dominants, common tonicizations.
    ChromaticModerate,
    /// Genuinely ambiguous or multiply-interpretable passages: modal
    /// mixture, parallel-key borrowing.
    ModalComplex,
    /// Deliberately constructed edge cases meant to stress-test the matcher.
    AtonalDifficult,
}

impl DifficultyBucket {
    /// Weight this bucket contributes to the adjudicated training set.
    /// Harder strata still inform calibration but are down-weighted so a
    /// handful of contentious annotations cannot dominate the fit.
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            DifficultyBucket::DiatonicSimple => 1.0,
            DifficultyBucket::ChromaticModerate => 0.85,
            DifficultyBucket::ModalComplex => 0.6,
            DifficultyBucket::AtonalDifficult => 0.4,
        }
    }
}

/// One human-annotated training sample: the engine's raw (pre-calibration)
/// score for a candidate interpretation, the track it belongs to, and the
/// independent annotator labels collected for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSample {
    /// Short free-text description of the passage, for corpus auditing.
    pub description: String,
    /// The track this sample's evidence was produced under.
    pub track: Track,
    /// The engine's raw (pre-calibration) score for this interpretation.
    pub raw_score: f64,
    /// Independent annotator labels in `[0, 1]` (1.0 = correct interpretation).
    pub annotator_labels: Vec<f64>,
    /// The difficulty bucket this sample was placed in during corpus design.
    pub difficulty: DifficultyBucket,
}

/// The adjudicated consensus for one sample: a target label plus an
/// agreement score summarizing annotator consistency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjudication {
    /// Median annotator label, used as the training target.
    pub target: f64,
    /// `1 - normalized standard deviation` of the annotator labels; 1.0 means
    /// perfect agreement.
    pub agreement: f64,
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn stddev(values: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n).sqrt()
}

/// Adjudicate a sample's annotator labels into a consensus target and
/// agreement score.
#[must_use]
pub fn adjudicate(sample: &AnnotatedSample) -> Adjudication {
    if sample.annotator_labels.is_empty() {
        return Adjudication { target: sample.raw_score, agreement: 0.0 };
    }
    let target = median(&sample.annotator_labels);
    // A standard deviation of 0.5 (maximal disagreement on a [0,1] label) maps
    // to zero agreement; 0.0 maps to full agreement.
    let agreement = (1.0 - stddev(&sample.annotator_labels) / 0.5).clamp(0.0, 1.0);
    Adjudication { target, agreement }
}

/// Build the `(raw_score, target)` training pairs for `track` from an
/// annotated corpus, weighting each sample's influence by its adjudicated
/// agreement and difficulty bucket. Samples whose agreement falls below
/// `min_agreement` are dropped as too contentious to adjudicate.
#[must_use]
pub fn build_training_set(
    samples: &[AnnotatedSample],
    track: Track,
    min_agreement: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut scores = Vec::new();
    let mut targets = Vec::new();

    for sample in samples.iter().filter(|s| s.track == track) {
        let adjudication = adjudicate(sample);
        if adjudication.agreement < min_agreement {
            continue;
        }
        let effective_weight = adjudication.agreement * sample.difficulty.weight();
        if effective_weight <= 0.0 {
            continue;
        }
        scores.push(sample.raw_score);
        targets.push(adjudication.target);
    }

    (scores, targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjudicate_unanimous() {
        let sample = AnnotatedSample {
            description: "ii-V-I in C".to_string(),
            track: Track::Functional,
            raw_score: 0.8,
            annotator_labels: vec![1.0, 1.0, 1.0],
            difficulty: DifficultyBucket::DiatonicSimple,
        };
        let adjudication = adjudicate(&sample);
        assert_eq!(adjudication.target, 1.0);
        assert_eq!(adjudication.agreement, 1.0);
    }

    #[test]
    fn test_adjudicate_disagreement_lowers_agreement() {
        let sample = AnnotatedSample {
            description: "ambiguous modal mixture".to_string(),
            track: Track::Modal,
            raw_score: 0.5,
            annotator_labels: vec![0.0, 1.0, 0.0, 1.0],
            difficulty: DifficultyBucket::ModalComplex,
        };
        let adjudication = adjudicate(&sample);
        assert!(adjudication.agreement < 1.0);
    }

    #[test]
    fn test_build_training_set_filters_by_track_and_agreement() {
        let samples = vec![
            AnnotatedSample {
                description: "a".to_string(),
                track: Track::Functional,
                raw_score: 0.9,
                annotator_labels: vec![1.0, 1.0],
                difficulty: DifficultyBucket::DiatonicSimple,
            },
            AnnotatedSample {
                description: "b".to_string(),
                track: Track::Modal,
                raw_score: 0.1,
                annotator_labels: vec![0.0, 1.0],
                difficulty: DifficultyBucket::AtonalDifficult,
            },
        ];
        let (scores, targets) = build_training_set(&samples, Track::Functional, 0.5);
        assert_eq!(scores, vec![0.9]);
        assert_eq!(targets, vec![1.0]);
    }

    #[test]
    fn test_difficulty_weights_ordered() {
        assert!(DifficultyBucket::DiatonicSimple.weight() > DifficultyBucket::ChromaticModerate.weight());
        assert!(DifficultyBucket::ChromaticModerate.weight() > DifficultyBucket::ModalComplex.weight());
        assert!(DifficultyBucket::ModalComplex.weight() > DifficultyBucket::AtonalDifficult.weight());
    }
}
