//! Arbitration: selecting a primary interpretation from the calibrated
//! per-track evidence, with profile-aware tie-breaking, plus the bounded
//! alternatives list (§4.10).
//!
//! Zero or low-confidence evidence is not an error (§7): a sparse analysis
//! still produces a well-formed primary, reflecting the input with
//! `combined_score = 0.0` and no supporting citations.

use crate::aggregator::TrackEvidence;
use harmony_config::ArbitrationParameters;
use harmony_patterns::Track;

/// The arbitrated result: a primary interpretation plus a bounded list of
/// close-scoring alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationResult {
    /// The chosen primary track's evidence.
    pub primary: TrackEvidence,
    /// Other tracks whose calibrated score came within
    /// `ArbitrationParameters::confidence_threshold` of the primary's.
    pub alternatives: Vec<TrackEvidence>,
}

fn find_track(evidence: &[TrackEvidence], track: Track) -> Option<usize> {
    evidence.iter().position(|e| e.track == track)
}

fn empty_interpretation() -> TrackEvidence {
    TrackEvidence {
        track: Track::Functional,
        combined_score: 0.0,
        contributing: Vec::new(),
    }
}

/// Choose the primary interpretation among `evidence` (already calibrated),
/// applying the `pop`-profile modal-override margin, then collect
/// alternatives within the confidence threshold of the primary. Never
/// fails: when `evidence` is empty the result is a zero-confidence
/// placeholder with no alternatives, per the "analytical non-result" rule.
#[must_use]
pub fn choose_primary(evidence: Vec<TrackEvidence>, profile: &str, params: &ArbitrationParameters) -> ArbitrationResult {
    if evidence.is_empty() {
        return ArbitrationResult {
            primary: empty_interpretation(),
            alternatives: Vec::new(),
        };
    }

    let mut primary_idx = 0;
    if profile == "pop" {
        if let (Some(functional_idx), Some(modal_idx)) =
            (find_track(&evidence, Track::Functional), find_track(&evidence, Track::Modal))
        {
            let functional_score = evidence[functional_idx].combined_score;
            let modal_score = evidence[modal_idx].combined_score;
            if modal_score >= functional_score + params.pop_modal_override_margin {
                primary_idx = modal_idx;
            } else {
                primary_idx = functional_idx;
            }
        }
    }

    let mut sorted_indices: Vec<usize> = (0..evidence.len()).collect();
    sorted_indices.sort_by(|&a, &b| {
        evidence[b]
            .combined_score
            .partial_cmp(&evidence[a].combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if profile != "pop" {
        primary_idx = sorted_indices[0];
    }

    let mut evidence = evidence;
    let primary = evidence.remove(primary_idx);

    let mut alternatives: Vec<TrackEvidence> = evidence
        .into_iter()
        .filter(|e| (primary.combined_score - e.combined_score).abs() <= params.confidence_threshold)
        .collect();
    alternatives.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap_or(std::cmp::Ordering::Equal));
    alternatives.truncate(params.max_alternatives);

    ArbitrationResult { primary, alternatives }
}
