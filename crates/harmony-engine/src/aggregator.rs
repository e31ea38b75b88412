//! Evidence aggregation: conflict resolution between overlapping matches
//! (soft-NMS, max-pooling, or none) and soft-OR combination per track
//! (§4.7).

use crate::matcher::PatternMatch;
use harmony_config::AggregationParameters;
use harmony_patterns::Track;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// How overlapping pattern matches are reconciled before combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictResolution {
    /// Decay lower-scoring overlapping matches by `exp(-overlap^2 / sigma)`
    /// instead of discarding them outright. The default.
    SoftNms,
    /// Keep only the highest-scoring match among any set of mutually
    /// overlapping matches, discarding the rest.
    MaxPool,
    /// Apply no conflict resolution; every match contributes independently.
    None,
}

impl Default for ConflictResolution {
    fn default() -> Self {
        ConflictResolution::SoftNms
    }
}

fn overlap_fraction(a: &PatternMatch, b: &PatternMatch) -> f64 {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    if end <= start {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let intersection = (end - start) as f64;
    #[allow(clippy::cast_precision_loss)]
    let shorter = a.len().min(b.len()) as f64;
    if shorter == 0.0 {
        0.0
    } else {
        intersection / shorter
    }
}

/// Rescore overlapping matches by the soft-NMS decay curve, iteratively
/// pulling out the current best match and decaying its remaining
/// overlapping peers. Every input match survives, with a possibly-lowered
/// score.
fn soft_nms(matches: Vec<PatternMatch>, sigma: f64) -> Vec<PatternMatch> {
    let mut remaining = matches;
    let mut resolved = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let best_idx = remaining
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
            .expect("remaining is non-empty");
        let best = remaining.swap_remove(best_idx);

        for candidate in &mut remaining {
            let overlap = overlap_fraction(&best, candidate);
            if overlap > 0.0 {
                candidate.score *= (-(overlap * overlap) / sigma).exp();
            }
        }

        resolved.push(best);
    }

    resolved
}

/// Keep only the highest-scoring match within each cluster of mutually
/// overlapping matches.
fn max_pool(mut matches: Vec<PatternMatch>) -> Vec<PatternMatch> {
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    let mut kept: Vec<PatternMatch> = Vec::new();
    for candidate in matches {
        if !kept.iter().any(|k| k.overlaps(&candidate)) {
            kept.push(candidate);
        }
    }
    kept
}

/// The combined evidence for a single analytical track, after conflict
/// resolution and soft-OR combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEvidence {
    /// The track this evidence belongs to.
    pub track: Track,
    /// The soft-OR combined score, after the diversity bonus, clamped to
    /// `[0, 1]`.
    pub combined_score: f64,
    /// Every match (post conflict-resolution) that contributed.
    pub contributing: Vec<PatternMatch>,
}

impl TrackEvidence {
    fn family_count(&self) -> usize {
        self.contributing
            .iter()
            .map(|m| m.family.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Combine independent per-match probabilities via soft-OR:
/// `1 - prod(1 - score_i)`.
fn soft_or(matches: &[PatternMatch]) -> f64 {
    let product_of_complements = matches.iter().fold(1.0_f64, |acc, m| acc * (1.0 - m.score));
    1.0 - product_of_complements
}

/// Resolve conflicts and combine per-track evidence. Tracks with no
/// contributing matches are omitted. Ties in downstream ranking are broken
/// by combined score, then distinct-family count, then track name, giving a
/// total order.
#[must_use]
pub fn aggregate(
    matches: Vec<PatternMatch>,
    conflict: ConflictResolution,
    params: &AggregationParameters,
) -> Vec<TrackEvidence> {
    let mut by_track: HashMap<Track, Vec<PatternMatch>> = HashMap::new();
    for m in matches {
        by_track.entry(m.track).or_default().push(m);
    }

    let mut evidence: Vec<TrackEvidence> = by_track
        .into_iter()
        .map(|(track, track_matches)| {
            let resolved = match conflict {
                ConflictResolution::SoftNms => soft_nms(track_matches, params.soft_nms_sigma),
                ConflictResolution::MaxPool => max_pool(track_matches),
                ConflictResolution::None => track_matches,
            };

            let mut combined = soft_or(&resolved);
            let evidence = TrackEvidence {
                track,
                combined_score: combined,
                contributing: resolved,
            };
            if evidence.family_count() >= 2 {
                combined = (combined + params.diversity_bonus).min(1.0);
            }
            TrackEvidence {
                combined_score: combined,
                ..evidence
            }
        })
        .collect();

    evidence.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.family_count().cmp(&a.family_count()))
            .then_with(|| format!("{:?}", a.track).cmp(&format!("{:?}", b.track)))
    });

    evidence
}
